use std::time::Duration;

use anyhow::{Context, Result};
use doodlify_core::Error;
use serde_json::Value;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("doodlify/", env!("CARGO_PKG_VERSION"));
const TIMEOUT: Duration = Duration::from_secs(30);

/// A GitHub repository addressed as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoName {
    pub owner: String,
    pub name: String,
}

impl RepoName {
    pub fn parse(full_name: &str) -> doodlify_core::Result<Self> {
        let trimmed = full_name.trim().trim_end_matches(".git");
        match trimmed.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(Error::Config(format!(
                "repository name must look like owner/repo, got \"{full_name}\""
            ))),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Status code and decoded JSON body (null when empty or not JSON).
pub(crate) struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking GitHub REST v3 client for one repository.
pub struct GitHubClient {
    agent: ureq::Agent,
    token: String,
    api_base: String,
    pub(crate) repo: RepoName,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, repo_full_name: &str) -> doodlify_core::Result<Self> {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Ok(Self {
            agent,
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            repo: RepoName::parse(repo_full_name)?,
        })
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn repo(&self) -> &RepoName {
        &self.repo
    }

    /// HTTPS clone URL carrying the token, for the git capability.
    pub fn clone_url(&self) -> String {
        format!(
            "https://x-access-token:{}@github.com/{}.git",
            self.token,
            self.repo.full_name()
        )
    }

    pub(crate) fn repo_path(&self, tail: &str) -> String {
        format!("repos/{}/{tail}", self.repo.full_name())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    fn with_headers<B>(&self, req: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        req.header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    pub(crate) fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse> {
        let mut req = self.with_headers(self.agent.get(&self.url(path)));
        for (k, v) in query {
            req = req.query(*k, *v);
        }
        let response = req.call().with_context(|| format!("GET {path}"))?;
        read(path, response)
    }

    pub(crate) fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        let response = self
            .with_headers(self.agent.post(&self.url(path)))
            .header("Content-Type", "application/json")
            .send(body.to_string())
            .with_context(|| format!("POST {path}"))?;
        read(path, response)
    }
}

fn read(path: &str, mut response: ureq::http::Response<ureq::Body>) -> Result<ApiResponse> {
    let status = response.status().as_u16();
    let text = response
        .body_mut()
        .read_to_string()
        .with_context(|| format!("reading {path} response"))?;
    let body = serde_json::from_str(&text).unwrap_or(Value::Null);
    tracing::debug!(path, status, "github api call");
    Ok(ApiResponse { status, body })
}

/// Human-readable reason from a GitHub error body: `message` plus any
/// `errors[].message` details.
pub(crate) fn error_message(body: &Value) -> String {
    let mut parts = Vec::new();
    if let Some(m) = body["message"].as_str() {
        parts.push(m.to_string());
    }
    if let Some(errors) = body["errors"].as_array() {
        parts.extend(errors.iter().filter_map(|e| e["message"].as_str()).map(String::from));
    }
    if parts.is_empty() {
        "no details".to_string()
    } else {
        parts.join(": ")
    }
}

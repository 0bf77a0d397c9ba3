use anyhow::{anyhow, bail, Result};
use doodlify_conductor::{CodeHost, IssueRef, PullRequestRef, PullRequestRequest};
use serde_json::{json, Value};

use crate::client::{error_message, GitHubClient, RepoName};

/// Search query for open issues whose title contains `title`.
pub(crate) fn issue_search_query(repo: &RepoName, title: &str) -> String {
    let phrase = title.replace('"', " ");
    format!("repo:{} is:issue state:open \"{}\" in:title", repo.full_name(), phrase.trim())
}

/// The search hit whose title equals `title` exactly. Pull requests are ignored.
pub(crate) fn find_exact_title(search: &Value, title: &str) -> Option<IssueRef> {
    search["items"]
        .as_array()?
        .iter()
        .filter(|item| item.get("pull_request").is_none())
        .find(|item| item["title"].as_str() == Some(title))
        .and_then(issue_ref)
}

fn issue_ref(item: &Value) -> Option<IssueRef> {
    Some(IssueRef {
        number: item["number"].as_u64()?,
        url: item["html_url"].as_str().map(String::from),
    })
}

pub(crate) fn pull_ref(item: &Value) -> Option<PullRequestRef> {
    Some(PullRequestRef {
        number: item["number"].as_u64()?,
        url: item["html_url"].as_str()?.to_string(),
    })
}

impl GitHubClient {
    fn find_open_issue(&self, title: &str) -> Option<IssueRef> {
        let query = issue_search_query(&self.repo, title);
        match self.get("search/issues", &[("q", query.as_str()), ("per_page", "30")]) {
            Ok(resp) if resp.is_success() => find_exact_title(&resp.body, title),
            Ok(resp) => {
                tracing::warn!(status = resp.status, reason = %error_message(&resp.body), "issue search failed");
                None
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "issue search failed");
                None
            }
        }
    }

    fn find_open_pull(&self, head: &str) -> Result<Option<PullRequestRef>> {
        let head_ref = format!("{}:{head}", self.repo.owner);
        let resp = self.get(
            &self.repo_path("pulls"),
            &[("head", head_ref.as_str()), ("state", "open")],
        )?;
        if !resp.is_success() {
            return Ok(None);
        }
        Ok(resp.body.as_array().and_then(|pulls| pulls.first()).and_then(pull_ref))
    }
}

impl CodeHost for GitHubClient {
    fn create_or_find_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<IssueRef> {
        if let Some(existing) = self.find_open_issue(title) {
            tracing::debug!(number = existing.number, "reusing open issue");
            return Ok(existing);
        }
        let mut payload = json!({ "title": title, "body": body });
        if !labels.is_empty() {
            payload["labels"] = json!(labels);
        }
        let resp = self.post(&self.repo_path("issues"), &payload)?;
        if !resp.is_success() {
            bail!("creating issue failed (HTTP {}): {}", resp.status, error_message(&resp.body));
        }
        issue_ref(&resp.body).ok_or_else(|| anyhow!("issue response had no number"))
    }

    fn create_pull_request(&self, req: &PullRequestRequest<'_>) -> Result<PullRequestRef> {
        let payload = json!({
            "title": req.title,
            "body": req.body,
            "head": req.head,
            "base": req.base,
        });
        let resp = self.post(&self.repo_path("pulls"), &payload)?;
        if resp.is_success() {
            return pull_ref(&resp.body).ok_or_else(|| anyhow!("pull request response had no number"));
        }
        // 422 covers "a pull request already exists" for this head.
        if resp.status == 422 {
            if let Some(existing) = self.find_open_pull(req.head)? {
                tracing::debug!(number = existing.number, "reusing open pull request");
                return Ok(existing);
            }
        }
        bail!(
            "creating pull request failed (HTTP {}): {}",
            resp.status,
            error_message(&resp.body)
        )
    }
}

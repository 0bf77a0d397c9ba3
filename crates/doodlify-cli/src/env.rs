use std::path::PathBuf;

use doodlify_core::{Error, Result};

pub const DEFAULT_WORKSPACE: &str = ".doodlify-workspace";

/// Runtime settings read from the environment. Empty values count as unset.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub github_token: Option<String>,
    pub openai_api_key: Option<String>,
    pub repo_name: Option<String>,
    /// Overrides `project.targetBranch`.
    pub target_branch: Option<String>,
    pub workspace_dir: PathBuf,
    pub image_model: Option<String>,
    pub text_model: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| get(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            github_token: var("GITHUB_PERSONAL_ACCESS_TOKEN"),
            openai_api_key: var("OPENAI_API_KEY"),
            repo_name: var("GITHUB_REPO_NAME"),
            target_branch: var("GIT_BRANCH_CHANGES_TARGET"),
            workspace_dir: var("DOODLIFY_WORKSPACE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE)),
            image_model: var("DOODLIFY_IMAGE_MODEL"),
            text_model: var("DOODLIFY_TEXT_MODEL"),
        }
    }

    pub fn github_token(&self) -> Result<&str> {
        require(&self.github_token, "GITHUB_PERSONAL_ACCESS_TOKEN")
    }

    pub fn openai_api_key(&self) -> Result<&str> {
        require(&self.openai_api_key, "OPENAI_API_KEY")
    }

    pub fn repo_name(&self) -> Result<&str> {
        require(&self.repo_name, "GITHUB_REPO_NAME")
    }
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| Error::Config(format!("environment variable {name} is not set")))
}

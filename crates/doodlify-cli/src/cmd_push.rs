use std::path::Path;

use anyhow::Result;
use doodlify_bridge_github::GitHubClient;
use doodlify_conductor::runner::run_push;

use crate::env::Settings;
use crate::session::{github_client, Session};

/// Execute `doodlify push`
pub fn execute(config_path: &Path) -> Result<()> {
    let settings = Settings::from_env();
    let github = github_client(&settings)?;
    let session = Session::online(config_path, &settings, &github)?;
    push(&session, &github)
}

pub(crate) fn push(session: &Session, github: &GitHubClient) -> Result<()> {
    let report = run_push(&session.store, &session.git, github)?;
    if !report.pushed.is_empty() {
        println!("\nOpened {} pull request(s).", report.pushed.len());
    }
    Ok(())
}

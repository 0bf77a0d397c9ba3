use std::path::Path;

use anyhow::Result;
use doodlify_analyzer::StaticAnalyzer;
use doodlify_bridge_github::GitHubClient;
use doodlify_conductor::runner::{run_analyze, AnalyzeOptions};
use jiff::Timestamp;

use crate::env::Settings;
use crate::session::{github_client, Session};

/// Execute `doodlify analyze`
pub fn execute(config_path: &Path, report_all: bool) -> Result<()> {
    let settings = Settings::from_env();
    let github = github_client(&settings)?;
    let session = Session::online(config_path, &settings, &github)?;
    analyze(&session, &github, report_all)?;
    println!("\nAnalysis complete.");
    Ok(())
}

pub(crate) fn analyze(session: &Session, github: &GitHubClient, report_all: bool) -> Result<()> {
    let report = run_analyze(
        &session.store,
        session.checkout(),
        &StaticAnalyzer,
        github,
        AnalyzeOptions { report_all },
        Timestamp::now(),
    )?;
    let suggestions = report.analysis.improvement_suggestions.len();
    if suggestions > 0 {
        println!(
            "  Suggestions: {suggestions} found, {} filed, {} already reported, {} disabled",
            report.filed.len(),
            report.already_reported,
            report.disabled
        );
    }
    Ok(())
}

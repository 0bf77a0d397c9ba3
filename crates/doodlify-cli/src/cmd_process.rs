use std::path::Path;

use anyhow::{bail, Result};
use doodlify_analyzer::StaticAnalyzer;
use doodlify_bridge_openai::OpenAiClient;
use doodlify_conductor::runner::{run_process, EventOutcome, ProcessCapabilities, ProcessOptions};
use jiff::Timestamp;

use crate::env::Settings;
use crate::session::{github_client, openai_client, Session};

/// Execute `doodlify process`
pub fn execute(config_path: &Path, opts: ProcessOptions) -> Result<()> {
    let settings = Settings::from_env();
    let github = github_client(&settings)?;
    let openai = openai_client(&settings)?;
    let session = Session::online(config_path, &settings, &github)?;
    process(&session, &openai, &opts)
}

pub(crate) fn process(session: &Session, openai: &OpenAiClient, opts: &ProcessOptions) -> Result<()> {
    let caps = ProcessCapabilities {
        analyzer: &StaticAnalyzer,
        images: openai,
        text: openai,
        vcs: &session.git,
    };
    let report = run_process(&session.store, session.checkout(), &caps, opts, Timestamp::now())?;

    let failed: Vec<&str> = report
        .events
        .iter()
        .filter_map(|e| match &e.outcome {
            EventOutcome::Failed(_) => Some(e.event_id.as_str()),
            _ => None,
        })
        .collect();
    if !failed.is_empty() {
        bail!("{} event(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

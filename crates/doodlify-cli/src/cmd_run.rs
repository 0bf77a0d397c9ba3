use std::path::Path;

use anyhow::{Context, Result};
use doodlify_conductor::runner::ProcessOptions;

use crate::cmd_analyze::analyze;
use crate::cmd_process::process;
use crate::cmd_push::push;
use crate::env::Settings;
use crate::session::{github_client, openai_client, Session};

/// Execute `doodlify run`: analyze, process and push in one go.
pub fn execute(config_path: &Path, report_all: bool, force: bool) -> Result<()> {
    let settings = Settings::from_env();
    let github = github_client(&settings)?;
    let openai = openai_client(&settings)?;
    let session = Session::online(config_path, &settings, &github)?;

    println!("\n── Analyze ──");
    analyze(&session, &github, report_all).context("analyze phase")?;
    println!("\n── Process ──");
    let opts = ProcessOptions {
        force,
        ..Default::default()
    };
    process(&session, &openai, &opts).context("process phase")?;
    println!("\n── Push ──");
    push(&session, &github).context("push phase")?;

    println!("\nWorkflow complete.");
    Ok(())
}

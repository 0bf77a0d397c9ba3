use std::path::Path;

use anyhow::{bail, Result};
use doodlify_conductor::runner::run_restore;
use doodlify_core::Error;

use crate::env::Settings;
use crate::session::Session;

/// Execute `doodlify restore --event-id <id> --files a,b`
pub fn execute(config_path: &Path, event_id: &str, files: &[String]) -> Result<()> {
    let files: Vec<String> = files
        .iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    if files.is_empty() {
        bail!(Error::Validation("--files needs at least one path".into()));
    }
    let session = Session::offline(config_path, &Settings::from_env())?;
    if !session.checkout().is_dir() {
        return Err(Error::NotFound(session.checkout().to_path_buf()).into());
    }

    println!("▶ Restoring {} file(s) for \"{event_id}\"", files.len());
    let report = run_restore(&session.store, session.checkout(), event_id, &files)?;
    println!(
        "\n{} restored, {} without backup. Run `doodlify process --event-id {event_id}` to theme them again.",
        report.restored.len(),
        report.skipped.len()
    );
    Ok(())
}

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use doodlify_core::Error;

use crate::env::Settings;
use crate::session::Session;

/// Execute `doodlify clear [--event-id <id>]`
pub fn execute(config_path: &Path, event_id: Option<&str>, yes: bool) -> Result<()> {
    let session = Session::offline(config_path, &Settings::from_env())?;
    let target = match event_id {
        Some(id) => format!("event \"{id}\""),
        None => "all events".to_string(),
    };
    if !yes && !confirm(&format!("Clear ledger data for {target}?"))? {
        println!("Aborted.");
        return Ok(());
    }

    match event_id {
        Some(id) => {
            let lock = session.store.load()?;
            if lock.event(id).is_none() {
                return Err(Error::Config(format!("unknown event id \"{id}\"")).into());
            }
            session.store.clear_event(id)?;
            println!("✓ Cleared progress for \"{id}\"");
        }
        None => {
            if session.store.clear_all()? {
                println!("✓ Cleared {}", session.store.location().file().display());
            } else {
                println!("Nothing to clear.");
            }
        }
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    std::io::stderr().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

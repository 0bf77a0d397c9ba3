use std::path::Path;

use anyhow::Result;
use doodlify_core::Error;
use doodlify_files::{detect_legacy_backups, migrate_legacy_backups};

use crate::env::Settings;
use crate::session::Session;

/// Execute `doodlify migrate-backups [--dry-run]`
pub fn execute(config_path: &Path, dry_run: bool) -> Result<()> {
    let session = Session::offline(config_path, &Settings::from_env())?;
    let root = session.checkout();
    if !root.is_dir() {
        return Err(Error::NotFound(root.to_path_buf()).into());
    }
    migrate(root, dry_run)
}

fn migrate(root: &Path, dry_run: bool) -> Result<()> {
    let legacy = detect_legacy_backups(root);
    if legacy.is_empty() {
        println!("No legacy backups found.");
        return Ok(());
    }
    println!("Found {} legacy backup(s)", legacy.len());
    let report = migrate_legacy_backups(root, dry_run)?;
    let verb = if dry_run { "[dry-run] would migrate" } else { "✓ migrated" };
    for rel in &report.migrated {
        println!("  {verb} {rel}");
    }
    for rel in &report.conflicts {
        println!("  ⚠ {rel} left in place: a new-style backup already exists");
    }
    Ok(())
}

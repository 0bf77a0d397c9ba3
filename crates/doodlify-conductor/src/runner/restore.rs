use std::path::Path;

use anyhow::Result;
use doodlify_core::{Error, FileState, FileStatusEntry, ProgressPatch};
use doodlify_files::{backup_path, has_backup, resolve, restore, to_repo_relative, RestoreOutcome};
use doodlify_ledger::LedgerStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: Vec<String>,
    /// Files without a backup, left untouched.
    pub skipped: Vec<String>,
}

/// Put specific files of an event back to their original bytes so the next
/// `process` themes them again.
pub fn run_restore(
    store: &LedgerStore,
    repo_root: &Path,
    event_id: &str,
    files: &[String],
) -> Result<RestoreReport> {
    let lock = store.load()?;
    if lock.event(event_id).is_none() {
        return Err(Error::Config(format!("unknown event id \"{event_id}\"")).into());
    }
    let sources = &store.config().project.sources;

    let mut report = RestoreReport::default();
    for raw in files {
        let path = resolve(repo_root, sources, raw)?;
        let rel = to_repo_relative(repo_root, &path);
        if !has_backup(&path) {
            tracing::warn!(file = %rel, "no backup to restore from");
            println!("  ⊘ {rel}: no backup, skipped");
            report.skipped.push(rel);
            continue;
        }
        let backup_rel = to_repo_relative(repo_root, &backup_path(&path));
        if restore(&path)? == RestoreOutcome::Restored {
            store.update_progress(
                event_id,
                ProgressPatch {
                    remove_modified: vec![backup_rel],
                    ..ProgressPatch::file(
                        rel.clone(),
                        FileStatusEntry::new(FileState::Pending, Some("restored from backup".into())),
                    )
                },
            )?;
            println!("  ✓ {rel} restored");
            report.restored.push(rel);
        }
    }
    Ok(report)
}

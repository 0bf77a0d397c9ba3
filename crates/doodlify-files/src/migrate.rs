//! One-time migration from `name.ext.original` backups to `name.original.ext`.

use std::fs;
use std::path::{Path, PathBuf};

use doodlify_core::Result;

use crate::backup::{backup_path, to_repo_relative, BACKUP_MARKER};
use crate::resolve::walk_files;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyBackup {
    /// `name.ext.original`
    pub legacy: PathBuf,
    /// `name.ext`
    pub live: PathBuf,
    /// `name.original.ext`
    pub target: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Repo-relative legacy paths that were (or, on a dry run, would be) renamed.
    pub migrated: Vec<String>,
    /// Legacy backups left in place because a new-style backup already exists.
    pub conflicts: Vec<String>,
}

/// Legacy backups under `repo_root` whose live file still exists.
pub fn detect_legacy_backups(repo_root: &Path) -> Vec<LegacyBackup> {
    let suffix = format!(".{BACKUP_MARKER}");
    walk_files(repo_root)
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            let live_name = name.strip_suffix(&suffix)?;
            // `LICENSE.original` is already the new scheme for extension-less files.
            let (stem, ext) = live_name.rsplit_once('.')?;
            if stem.is_empty() || ext.is_empty() {
                return None;
            }
            let live = path.with_file_name(live_name);
            if !live.is_file() {
                return None;
            }
            Some(LegacyBackup {
                target: backup_path(&live),
                live,
                legacy: path,
            })
        })
        .collect()
}

/// Rename every legacy backup to the current scheme. Nothing is touched on a dry run.
pub fn migrate_legacy_backups(repo_root: &Path, dry_run: bool) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();
    for found in detect_legacy_backups(repo_root) {
        let rel = to_repo_relative(repo_root, &found.legacy);
        if found.target.exists() {
            tracing::warn!(legacy = %rel, "new-style backup already present, leaving legacy file");
            report.conflicts.push(rel);
            continue;
        }
        if !dry_run {
            fs::rename(&found.legacy, &found.target)?;
        }
        report.migrated.push(rel);
    }
    Ok(report)
}

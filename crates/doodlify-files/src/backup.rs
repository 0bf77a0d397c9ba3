use std::fs;
use std::path::{Path, PathBuf};

use doodlify_core::{write_atomic, Error, Result};

/// Marker inserted into backup file names.
pub const BACKUP_MARKER: &str = "original";

/// `name.ext` → `name.original.ext`; `name` → `name.original`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}.{BACKUP_MARKER}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{BACKUP_MARKER}"),
    };
    path.with_file_name(name)
}

/// True when `path` is itself a backup: `name.original.ext`, `name.original`,
/// or the legacy `name.ext.original`. Backups are never candidates.
pub fn is_backup(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let parts: Vec<&str> = name.split('.').collect();
    let n = parts.len();
    let marked = |i: usize| parts[i] == BACKUP_MARKER && parts[..i].iter().any(|p| !p.is_empty());
    (n >= 2 && marked(n - 1)) || (n >= 3 && marked(n - 2))
}

/// True when the file has been transformed and not restored since.
pub fn has_backup(path: &Path) -> bool {
    backup_path(path).is_file()
}

/// Copy `path` byte for byte to its backup, replacing any previous backup.
/// Returns the backup's repo-relative path.
pub fn create_backup(repo_root: &Path, path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let backup = backup_path(path);
    // A partial backup would pass for a complete one, so it lands atomically.
    write_atomic(&backup, &fs::read(path)?)?;
    Ok(to_repo_relative(repo_root, &backup))
}

/// Overwrite the live file with its backup, keeping the backup.
pub fn reset_from_backup(path: &Path) -> Result<()> {
    let backup = backup_path(path);
    if !backup.is_file() {
        return Err(Error::NotFound(backup));
    }
    fs::copy(&backup, path)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    NoBackup,
}

/// Put the original bytes back and delete the backup. A missing backup is a no-op.
pub fn restore(path: &Path) -> Result<RestoreOutcome> {
    let backup = backup_path(path);
    if !backup.is_file() {
        return Ok(RestoreOutcome::NoBackup);
    }
    fs::copy(&backup, path)?;
    fs::remove_file(&backup)?;
    Ok(RestoreOutcome::Restored)
}

/// Path relative to `repo_root` with forward slashes. Paths outside the root
/// are returned as given.
pub fn to_repo_relative(repo_root: &Path, path: &Path) -> String {
    let Ok(rel) = path.strip_prefix(repo_root) else {
        return path.to_string_lossy().into_owned();
    };
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

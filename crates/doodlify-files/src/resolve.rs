use std::path::{Component, Path, PathBuf};

use doodlify_core::{Error, Result};
use walkdir::WalkDir;

/// Framework-convention subdirectories tried under each source hint.
const CONVENTION_DIRS: &[&str] = &["web-ui/src", "public"];

/// Directories never searched recursively.
const SKIP_DIRS: &[&str] = &[".git", "node_modules"];

/// Strip surrounding whitespace and any leading `/` or `./`.
pub fn normalize(raw: &str) -> String {
    let mut s = raw.trim().replace('\\', "/");
    loop {
        if let Some(rest) = s.strip_prefix("./") {
            s = rest.to_string();
        } else if let Some(rest) = s.strip_prefix('/') {
            s = rest.to_string();
        } else {
            break;
        }
    }
    s
}

/// Map a logical path onto a file under `repo_root`.
///
/// Candidates are tried in a fixed order and the first existing file wins:
/// the repo root, each source hint, the convention directories under each
/// hint, the convention directories under the root, a recursive suffix match,
/// then a recursive filename match preferring `src` or `public` locations.
/// When nothing exists the repo-root candidate is returned so the caller can
/// report it as missing. Only a missing `repo_root` is an error.
pub fn resolve(repo_root: &Path, hints: &[String], raw: &str) -> Result<PathBuf> {
    if !repo_root.is_dir() {
        return Err(Error::NotFound(repo_root.to_path_buf()));
    }
    let normalized = normalize(raw);
    let direct = repo_root.join(&normalized);
    if normalized.is_empty() {
        return Ok(direct);
    }

    let hints: Vec<String> = hints
        .iter()
        .map(|h| normalize(h))
        .filter(|h| !h.is_empty())
        .collect();

    let mut candidates = vec![direct.clone()];
    for hint in &hints {
        candidates.push(repo_root.join(hint).join(&normalized));
    }
    for hint in &hints {
        for dir in CONVENTION_DIRS {
            candidates.push(repo_root.join(hint).join(dir).join(&normalized));
        }
    }
    for dir in CONVENTION_DIRS {
        let base = repo_root.join(dir);
        if base.is_dir() {
            candidates.push(base.join(&normalized));
        }
    }
    if let Some(found) = candidates.into_iter().find(|c| c.is_file()) {
        return Ok(found);
    }

    let files = walk_files(repo_root);
    let wanted = Path::new(&normalized);
    if let Some(found) = files
        .iter()
        .find(|f| f.strip_prefix(repo_root).is_ok_and(|rel| rel.ends_with(wanted)))
    {
        return Ok(found.clone());
    }

    if let Some(name) = wanted.file_name() {
        let by_name: Vec<&PathBuf> = files.iter().filter(|f| f.file_name() == Some(name)).collect();
        let preferred = by_name
            .iter()
            .find(|f| f.strip_prefix(repo_root).is_ok_and(under_src_or_public))
            .or_else(|| by_name.first());
        if let Some(found) = preferred {
            tracing::debug!(raw, found = %found.display(), "resolved by file name");
            return Ok((*found).clone());
        }
    }

    Ok(direct)
}

/// Every regular file under `root`, sorted for deterministic matching.
pub(crate) fn walk_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && e.file_name()
                    .to_str()
                    .is_some_and(|n| SKIP_DIRS.contains(&n)))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

fn under_src_or_public(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(s) => s == "src" || s == "public",
        _ => false,
    })
}

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use doodlify_files::is_backup;
use walkdir::{DirEntry, WalkDir};

/// Directories never worth scanning: dependencies, build output, VCS internals.
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", "dist", "build", ".next", "out", "coverage", ".git"];

pub const FRONTEND_EXTENSIONS: &[&str] = &[
    "tsx", "ts", "jsx", "js", "vue", "svelte", "html", "htm", "css", "scss", "sass", "less",
];

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "ico"];

/// Path fragments that mark a JSON file as translation content.
const I18N_MARKERS: &[&str] = &["i18n", "locales", "lang", "translations", "messages.json"];

/// Files under the scanned roots, bucketed by what the analyzer does with them.
#[derive(Debug, Default)]
pub struct Inventory {
    pub roots: Vec<PathBuf>,
    pub frontend: Vec<PathBuf>,
    pub images: Vec<PathBuf>,
    pub i18n: Vec<PathBuf>,
}

/// Roots to scan: each configured source that exists, or the whole checkout
/// when no sources are configured.
pub fn search_roots(repo_root: &Path, sources: &[String]) -> Vec<PathBuf> {
    if sources.is_empty() {
        return vec![repo_root.to_path_buf()];
    }
    sources
        .iter()
        .map(|s| repo_root.join(s.trim_matches('/')))
        .filter(|p| p.is_dir())
        .collect()
}

pub fn inventory(repo_root: &Path, sources: &[String]) -> Inventory {
    let roots = search_roots(repo_root, sources);
    let mut seen = BTreeSet::new();
    for root in &roots {
        let walker = WalkDir::new(root).into_iter().filter_entry(|e| !is_excluded(e));
        for entry in walker.filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && !is_backup(entry.path()) {
                seen.insert(entry.into_path());
            }
        }
    }

    let mut inv = Inventory {
        roots,
        ..Default::default()
    };
    for path in seen {
        let Some(ext) = extension(&path) else { continue };
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            inv.images.push(path);
        } else if FRONTEND_EXTENSIONS.contains(&ext.as_str()) {
            inv.frontend.push(path);
        } else if ext == "json" && is_i18n_path(repo_root, &path) {
            inv.i18n.push(path);
        }
    }
    inv
}

pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn is_excluded(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|n| EXCLUDED_DIRS.contains(&n))
}

fn is_i18n_path(repo_root: &Path, path: &Path) -> bool {
    let rel = path.strip_prefix(repo_root).unwrap_or(path);
    let rel = rel.to_string_lossy().to_ascii_lowercase();
    I18N_MARKERS.iter().any(|m| rel.contains(m))
}

use std::path::{Path, PathBuf};

/// Configuration file names that mark an in-repo manifest.
pub const MANIFEST_NAMES: &[&str] = &["doodlify.json", ".doodlify.json", "doodlify.config.json"];

/// Ledger file inside the workspace, shared by every checked-out repo.
pub const WORKSPACE_LEDGER_FILE: &str = "config-lock.json";

/// Ledger file committed alongside the checkout.
pub const IN_REPO_LEDGER_FILE: &str = "doodlify.lock.json";

/// Where the ledger lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    /// `<workspace>/config-lock.json`, one entry per checkout.
    Workspace,
    /// `<checkout>/doodlify.lock.json`, committed with the themed files.
    InRepo,
}

impl LedgerMode {
    /// Manifest-named configuration files keep their ledger in the repo.
    pub fn from_config_path(path: &Path) -> Self {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if MANIFEST_NAMES.contains(&name) {
            LedgerMode::InRepo
        } else {
            LedgerMode::Workspace
        }
    }
}

/// Resolved ledger file plus the key it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerLocation {
    Workspace { file: PathBuf, repo_key: String },
    InRepo { file: PathBuf },
}

impl LedgerLocation {
    pub fn resolve(mode: LedgerMode, workspace_dir: &Path, checkout: &Path) -> Self {
        match mode {
            LedgerMode::Workspace => LedgerLocation::Workspace {
                file: workspace_dir.join(WORKSPACE_LEDGER_FILE),
                repo_key: repo_key(checkout),
            },
            LedgerMode::InRepo => LedgerLocation::InRepo {
                file: checkout.join(IN_REPO_LEDGER_FILE),
            },
        }
    }

    pub fn file(&self) -> &Path {
        match self {
            LedgerLocation::Workspace { file, .. } | LedgerLocation::InRepo { file } => file,
        }
    }

    pub fn mode(&self) -> LedgerMode {
        match self {
            LedgerLocation::Workspace { .. } => LedgerMode::Workspace,
            LedgerLocation::InRepo { .. } => LedgerMode::InRepo,
        }
    }

    /// Repo-relative path of the ledger when it lives inside the checkout.
    ///
    /// Stashing must leave this file alone and commits must include it.
    pub fn repo_relative(&self) -> Option<&'static str> {
        match self {
            LedgerLocation::InRepo { .. } => Some(IN_REPO_LEDGER_FILE),
            LedgerLocation::Workspace { .. } => None,
        }
    }
}

/// Checkout folder name, the key of this repo inside a workspace ledger.
fn repo_key(checkout: &Path) -> String {
    checkout
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| checkout.to_string_lossy().into_owned())
}

use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy shared by every Doodlify crate.
///
/// Propagation follows three levels: per-file errors (`NotFound`, `Transform`)
/// are downgraded to a `file_status` entry, per-event errors (`Commit`) are
/// downgraded to `status=failed`, and run-level errors (`Config`, `Validation`,
/// `Ledger`) reach the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or unreadable configuration, or a missing required environment input.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration parsed but violates the schema or an invariant.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// A referenced file or backup is absent.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The external transform or adaptation capability failed for one file.
    #[error("transform failed for {path}: {message}")]
    Transform { path: String, message: String },

    #[error(transparent)]
    Commit(#[from] CommitError),

    /// Pushing a branch or opening its pull request failed.
    #[error("push failed for event \"{event_id}\": {message}")]
    Push { event_id: String, message: String },

    /// The persisted ledger is corrupt or cannot be written. Never reset silently.
    #[error("ledger error ({}): {message}", path.display())]
    Ledger { path: PathBuf, message: String },

    #[error("unknown event: \"{0}\"")]
    UnknownEvent(String),

    #[error("invalid status transition for \"{event_id}\": {from} -> {to}")]
    InvalidTransition {
        event_id: String,
        from: String,
        to: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure modes of the version-control commit step.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("nothing to commit")]
    NothingToCommit,

    #[error("commit failed: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn ledger(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Error::Ledger {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// True for errors that must abort the whole run rather than one event.
    pub fn is_run_level(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::Validation(_) | Error::Ledger { .. } | Error::UnknownEvent(_)
        )
    }
}

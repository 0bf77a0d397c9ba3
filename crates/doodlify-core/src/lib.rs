pub mod calendar;
pub mod config;
pub mod error;
pub mod fsio;
pub mod model;
pub mod patch;

pub use calendar::{active_events, resolve_time_zone, unprocessed_active_events};
pub use config::{Config, DefaultsConfig, EventConfig, ProjectConfig};
pub use error::{CommitError, Error, Result};
pub use fsio::write_atomic;
pub use model::{
    suggestion_fingerprint, AnalysisResult, ConfigLock, EventLock, EventProgress, EventStatus,
    FileState, FileStatusEntry, ReportedSuggestion, Suggestion,
};
pub use patch::ProgressPatch;

/// Current UTC time as an RFC 3339 string, the timestamp format used throughout the ledger.
pub fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_utc();
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

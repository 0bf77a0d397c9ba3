use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::{Config, DefaultsConfig, EventConfig, ProjectConfig};

// ── Status enums ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Pending,
    Analyzing,
    Processing,
    Completed,
    Failed,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Analyzing => "analyzing",
            EventStatus::Processing => "processing",
            EventStatus::Completed => "completed",
            EventStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one file within an event's processing pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Processed,
    Unsupported,
    Missing,
    Skipped,
    Pending,
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileState::Processed => "processed",
            FileState::Unsupported => "unsupported",
            FileState::Missing => "missing",
            FileState::Skipped => "skipped",
            FileState::Pending => "pending",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileStatusEntry {
    pub status: FileState,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl FileStatusEntry {
    pub fn new(status: FileState, details: Option<String>) -> Self {
        Self {
            status,
            updated_at: crate::now_rfc3339(),
            details,
        }
    }
}

// ── Progress ──

/// Mutable per-event state. Only ever changed through a [`crate::ProgressPatch`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EventProgress {
    pub status: EventStatus,
    #[serde(default)]
    pub analyzed: bool,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub pushed: bool,
    #[serde(default)]
    pub branch_created: bool,
    #[serde(default)]
    pub pr_created: bool,
    #[serde(default)]
    pub pr_url: Option<String>,
    #[serde(default)]
    pub commit_sha: Option<String>,
    /// Ordered set: live files and their backups, in the order they were modified.
    #[serde(default)]
    pub modified_files: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    /// Keyed by repo-relative path.
    #[serde(default)]
    pub file_status: BTreeMap<String, FileStatusEntry>,
    /// Non-fatal operator notes, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl EventProgress {
    pub fn file_state(&self, path: &str) -> Option<FileState> {
        self.file_status.get(path).map(|e| e.status)
    }

    /// Files this event changed, excluding their backups.
    pub fn live_modified_files(&self) -> impl Iterator<Item = &str> {
        self.modified_files
            .iter()
            .map(String::as_str)
            .filter(|f| !is_backup_name(f))
    }
}

/// True when the final path segment carries the `.original` backup marker.
fn is_backup_name(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.ends_with(".original") || name.contains(".original.")
}

// ── Analysis ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Suggestion {
    /// Suggestion kind, matched against `defaults.reportSuggestions`.
    pub key: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Suggestion {
    pub fn fingerprint(&self) -> String {
        suggestion_fingerprint(&self.title, &self.body)
    }
}

/// Dedupe key for filed suggestions: hex SHA-256 of `title + "\n" + body`.
pub fn suggestion_fingerprint(title: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\n");
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnalysisResult {
    #[serde(default)]
    pub files_of_interest: Vec<String>,
    #[serde(default)]
    pub image_files: Vec<String>,
    #[serde(default)]
    pub text_files: Vec<String>,
    #[serde(default)]
    pub selectors_found: Vec<String>,
    #[serde(default)]
    pub notes: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub improvement_suggestions: Vec<Suggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<String>,
}

impl AnalysisResult {
    /// Remove duplicate paths from every list, keeping first occurrences in order.
    pub fn dedup(mut self) -> Self {
        dedup_in_place(&mut self.files_of_interest);
        dedup_in_place(&mut self.image_files);
        dedup_in_place(&mut self.text_files);
        dedup_in_place(&mut self.selectors_found);
        self
    }
}

fn dedup_in_place(items: &mut Vec<String>) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

// ── Ledger ──

/// One configured event plus its mutable progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventLock {
    #[serde(flatten)]
    pub event: EventConfig,
    #[serde(default)]
    pub progress: EventProgress,
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub last_executed: Option<String>,
}

impl EventLock {
    pub fn from_config(event: &EventConfig) -> Self {
        Self {
            event: event.clone(),
            progress: EventProgress::default(),
            analysis: None,
            last_executed: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.event.id
    }

    /// Reset to a fresh pending record, keeping the declarative part.
    pub fn reset(&mut self) {
        self.progress = EventProgress::default();
        self.analysis = None;
        self.last_executed = None;
    }
}

/// A suggestion already filed as an issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportedSuggestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub title: String,
    pub fingerprint: String,
    pub issue_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_url: Option<String>,
}

/// The persisted ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigLock {
    pub project: ProjectConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub events: Vec<EventLock>,
    #[serde(default)]
    pub global_analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub reported_suggestions: Vec<ReportedSuggestion>,
}

impl ConfigLock {
    /// Fresh ledger: one pending record per configured event, no analysis.
    pub fn from_config(config: &Config) -> Self {
        Self {
            project: config.project.clone(),
            defaults: config.defaults.clone(),
            events: config.events.iter().map(EventLock::from_config).collect(),
            global_analysis: None,
            last_updated: crate::now_rfc3339(),
            reported_suggestions: Vec::new(),
        }
    }

    pub fn event(&self, id: &str) -> Option<&EventLock> {
        self.events.iter().find(|e| e.event.id == id)
    }

    pub fn event_mut(&mut self, id: &str) -> Option<&mut EventLock> {
        self.events.iter_mut().find(|e| e.event.id == id)
    }

    /// Bring the declarative half of the ledger in line with `events`.
    ///
    /// Known records get their configuration refreshed and keep their progress;
    /// unknown events are appended as pending. Records for events no longer
    /// configured are kept. Returns true when anything changed.
    pub fn reconcile_events(&mut self, events: &[EventConfig]) -> bool {
        let mut changed = false;
        for event in events {
            match self.event_mut(&event.id) {
                Some(existing) if existing.event == *event => {}
                Some(existing) => {
                    existing.event = event.clone();
                    changed = true;
                }
                None => {
                    self.events.push(EventLock::from_config(event));
                    changed = true;
                }
            }
        }
        changed
    }

    pub fn is_reported(&self, fingerprint: &str) -> bool {
        self.reported_suggestions
            .iter()
            .any(|r| r.fingerprint == fingerprint)
    }

    /// Events with committed work that has not been published yet, in declaration order.
    pub fn unpushed_events(&self) -> impl Iterator<Item = &EventLock> {
        self.events
            .iter()
            .filter(|e| e.progress.processed && !e.progress.pushed)
    }
}

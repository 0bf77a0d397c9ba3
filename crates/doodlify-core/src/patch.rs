use crate::model::{EventLock, EventStatus, FileStatusEntry};

/// Partial update of one event's progress.
///
/// `None` leaves a field untouched. For nullable fields the inner option is the
/// new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProgressPatch {
    pub status: Option<EventStatus>,
    pub analyzed: Option<bool>,
    pub processed: Option<bool>,
    pub pushed: Option<bool>,
    pub branch_created: Option<bool>,
    pub pr_created: Option<bool>,
    pub pr_url: Option<Option<String>>,
    pub commit_sha: Option<Option<String>>,
    pub error: Option<Option<String>>,
    pub started_at: Option<Option<String>>,
    pub completed_at: Option<Option<String>>,
    pub last_executed: Option<Option<String>>,
    /// Appended to `modified_files`, skipping entries already present.
    pub add_modified: Vec<String>,
    pub remove_modified: Vec<String>,
    /// Upserted into `file_status`.
    pub file_updates: Vec<(String, FileStatusEntry)>,
    pub add_notes: Vec<String>,
}

impl ProgressPatch {
    pub fn status(status: EventStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn file(path: impl Into<String>, entry: FileStatusEntry) -> Self {
        Self {
            file_updates: vec![(path.into(), entry)],
            ..Default::default()
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(Some(error.into()));
        self
    }

    pub fn with_modified(mut self, paths: impl IntoIterator<Item = String>) -> Self {
        self.add_modified.extend(paths);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.analyzed.is_none()
            && self.processed.is_none()
            && self.pushed.is_none()
            && self.branch_created.is_none()
            && self.pr_created.is_none()
            && self.pr_url.is_none()
            && self.commit_sha.is_none()
            && self.error.is_none()
            && self.started_at.is_none()
            && self.completed_at.is_none()
            && self.last_executed.is_none()
            && self.add_modified.is_empty()
            && self.remove_modified.is_empty()
            && self.file_updates.is_empty()
            && self.add_notes.is_empty()
    }

    pub fn apply(self, lock: &mut EventLock) {
        let p = &mut lock.progress;
        if let Some(v) = self.status {
            p.status = v;
        }
        if let Some(v) = self.analyzed {
            p.analyzed = v;
        }
        if let Some(v) = self.processed {
            p.processed = v;
        }
        if let Some(v) = self.pushed {
            p.pushed = v;
        }
        if let Some(v) = self.branch_created {
            p.branch_created = v;
        }
        if let Some(v) = self.pr_created {
            p.pr_created = v;
        }
        if let Some(v) = self.pr_url {
            p.pr_url = v;
        }
        if let Some(v) = self.commit_sha {
            p.commit_sha = v;
        }
        if let Some(v) = self.error {
            p.error = v;
        }
        if let Some(v) = self.started_at {
            p.started_at = v;
        }
        if let Some(v) = self.completed_at {
            p.completed_at = v;
        }
        if !self.remove_modified.is_empty() {
            p.modified_files
                .retain(|f| !self.remove_modified.iter().any(|r| r == f));
        }
        for path in self.add_modified {
            if !p.modified_files.contains(&path) {
                p.modified_files.push(path);
            }
        }
        for (path, entry) in self.file_updates {
            p.file_status.insert(path, entry);
        }
        p.notes.extend(self.add_notes);
        if let Some(v) = self.last_executed {
            lock.last_executed = v;
        }
    }
}

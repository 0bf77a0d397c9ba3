use std::collections::BTreeMap;
use std::path::Path;

use doodlify_core::{
    write_atomic, AnalysisResult, Config, ConfigLock, Error, EventLock, ProgressPatch,
    ReportedSuggestion, Result,
};
use serde_json::Value;

use crate::overrides::ConfigOverrides;
use crate::paths::LedgerLocation;

/// Sole owner of the persisted ledger.
///
/// Every mutating call loads the current ledger, applies its change and writes
/// it back before returning. Callers get a snapshot and never hold a live copy.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    config: Config,
    location: LedgerLocation,
}

impl LedgerStore {
    pub fn new(config: Config, location: LedgerLocation) -> Self {
        Self { config, location }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn location(&self) -> &LedgerLocation {
        &self.location
    }

    /// Load the ledger, creating and persisting a fresh one when none exists.
    ///
    /// Events added to the configuration since the last save are appended.
    pub fn load(&self) -> Result<ConfigLock> {
        match self.read()? {
            Some(mut lock) => {
                if lock.reconcile_events(&self.config.events) {
                    tracing::debug!(file = %self.location.file().display(), "ledger reconciled with configuration");
                    self.save(&mut lock)?;
                }
                Ok(lock)
            }
            None => {
                let mut lock = ConfigLock::from_config(&self.config);
                self.save(&mut lock)?;
                Ok(lock)
            }
        }
    }

    /// Persist the whole ledger, refreshing `last_updated`.
    pub fn save(&self, lock: &mut ConfigLock) -> Result<()> {
        lock.last_updated = doodlify_core::now_rfc3339();
        let file = self.location.file();
        let data = match &self.location {
            LedgerLocation::InRepo { .. } => serde_json::to_string_pretty(lock)?,
            LedgerLocation::Workspace { repo_key, .. } => {
                // Read-merge-write: other repositories share this file.
                let mut entries = read_workspace_map(file)?.unwrap_or_default();
                entries.insert(repo_key.clone(), serde_json::to_value(&*lock)?);
                serde_json::to_string_pretty(&entries)?
            }
        };
        write_atomic(file, data.as_bytes()).map_err(|e| Error::ledger(file, e))?;
        Ok(())
    }

    fn read(&self) -> Result<Option<ConfigLock>> {
        let file = self.location.file();
        match &self.location {
            LedgerLocation::InRepo { .. } => {
                let Some(content) = read_if_exists(file)? else {
                    return Ok(None);
                };
                let lock = serde_json::from_str(&content).map_err(|e| Error::ledger(file, e))?;
                Ok(Some(lock))
            }
            LedgerLocation::Workspace { repo_key, .. } => {
                let Some(mut entries) = read_workspace_map(file)? else {
                    return Ok(None);
                };
                match entries.remove(repo_key) {
                    Some(value) => {
                        let lock = serde_json::from_value(value)
                            .map_err(|e| Error::ledger(file, format!("entry \"{repo_key}\": {e}")))?;
                        Ok(Some(lock))
                    }
                    None => Ok(None),
                }
            }
        }
    }

    // ── Mutations ──

    /// Load, mutate one event, persist. Returns the saved snapshot.
    pub fn update_event<F>(&self, event_id: &str, f: F) -> Result<ConfigLock>
    where
        F: FnOnce(&mut EventLock) -> Result<()>,
    {
        let mut lock = self.load()?;
        let event = lock
            .event_mut(event_id)
            .ok_or_else(|| Error::UnknownEvent(event_id.to_string()))?;
        f(event)?;
        self.save(&mut lock)?;
        Ok(lock)
    }

    /// The single entry point for progress changes. An empty patch writes nothing.
    pub fn update_progress(&self, event_id: &str, patch: ProgressPatch) -> Result<ConfigLock> {
        if patch.is_empty() {
            let lock = self.load()?;
            if lock.event(event_id).is_none() {
                return Err(Error::UnknownEvent(event_id.to_string()));
            }
            return Ok(lock);
        }
        self.update_event(event_id, |event| {
            patch.apply(event);
            Ok(())
        })
    }

    /// Cache an analysis on one event and mark it analyzed.
    pub fn update_event_analysis(&self, event_id: &str, analysis: AnalysisResult) -> Result<ConfigLock> {
        self.update_event(event_id, |event| {
            event.analysis = Some(analysis);
            event.progress.analyzed = true;
            Ok(())
        })
    }

    pub fn update_global_analysis(&self, analysis: AnalysisResult) -> Result<ConfigLock> {
        let mut lock = self.load()?;
        lock.global_analysis = Some(analysis);
        self.save(&mut lock)?;
        Ok(lock)
    }

    /// Remember a filed suggestion. A fingerprint is recorded at most once.
    pub fn record_reported_suggestion(&self, reported: ReportedSuggestion) -> Result<ConfigLock> {
        let mut lock = self.load()?;
        if !lock.is_reported(&reported.fingerprint) {
            lock.reported_suggestions.push(reported);
            self.save(&mut lock)?;
        }
        Ok(lock)
    }

    /// Reset one event to a fresh pending record.
    pub fn clear_event(&self, event_id: &str) -> Result<ConfigLock> {
        self.update_event(event_id, |event| {
            event.reset();
            Ok(())
        })
    }

    /// Forget this repository's ledger entirely. Other repositories sharing a
    /// workspace file are kept. Returns false when there was nothing to clear.
    pub fn clear_all(&self) -> Result<bool> {
        let file = self.location.file();
        match &self.location {
            LedgerLocation::InRepo { .. } => {
                if !file.exists() {
                    return Ok(false);
                }
                std::fs::remove_file(file).map_err(|e| Error::ledger(file, e))?;
                Ok(true)
            }
            LedgerLocation::Workspace { repo_key, .. } => {
                let Some(mut entries) = read_workspace_map(file)? else {
                    return Ok(false);
                };
                if entries.remove(repo_key).is_none() {
                    return Ok(false);
                }
                if entries.is_empty() {
                    std::fs::remove_file(file).map_err(|e| Error::ledger(file, e))?;
                } else {
                    let data = serde_json::to_string_pretty(&entries)?;
                    write_atomic(file, data.as_bytes()).map_err(|e| Error::ledger(file, e))?;
                }
                Ok(true)
            }
        }
    }

    /// Merge an override document into the configuration and mirror the result
    /// into the ledger.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<ConfigLock> {
        let merged = overrides.merge_into(&self.config)?;
        self.config = merged;
        let mut lock = match self.read()? {
            Some(lock) => lock,
            None => ConfigLock::from_config(&self.config),
        };
        lock.project = self.config.project.clone();
        lock.defaults = self.config.defaults.clone();
        lock.reconcile_events(&self.config.events);
        self.save(&mut lock)?;
        Ok(lock)
    }
}

fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::ledger(path, e)),
    }
}

fn read_workspace_map(path: &Path) -> Result<Option<BTreeMap<String, Value>>> {
    let Some(content) = read_if_exists(path)? else {
        return Ok(None);
    };
    let entries = serde_json::from_str(&content).map_err(|e| Error::ledger(path, e))?;
    Ok(Some(entries))
}

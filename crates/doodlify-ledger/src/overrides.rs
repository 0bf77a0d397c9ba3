use std::path::Path;

use doodlify_core::{Config, DefaultsConfig, EventConfig, Error, ProjectConfig, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Partial configuration committed inside the target repository.
///
/// `project` and `defaults` are merged key by key over the loaded
/// configuration; `events`, when present, replaces the event list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub project: Map<String, Value>,
    #[serde(default)]
    pub defaults: Map<String, Value>,
    #[serde(default)]
    pub events: Option<Value>,
}

impl ConfigOverrides {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read overrides {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::Validation(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.project.is_empty() && self.defaults.is_empty() && self.events.is_none()
    }

    /// Produce a new validated configuration with these overrides on top.
    pub fn merge_into(&self, base: &Config) -> Result<Config> {
        let project: ProjectConfig = merge_section(&base.project, &self.project, "project")?;
        let defaults: DefaultsConfig = merge_section(&base.defaults, &self.defaults, "defaults")?;
        let events: Vec<EventConfig> = match &self.events {
            Some(events) => serde_json::from_value(events.clone())
                .map_err(|e| Error::Validation(format!("events: {e}")))?,
            None => base.events.clone(),
        };
        let merged = Config {
            project,
            defaults,
            events,
        };
        merged.validate()?;
        Ok(merged)
    }
}

fn merge_section<T>(base: &T, patch: &Map<String, Value>, section: &str) -> Result<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let mut value = serde_json::to_value(base)?;
    if let Value::Object(fields) = &mut value {
        for (k, v) in patch {
            fields.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(value).map_err(|e| Error::Validation(format!("{section}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{LedgerLocation, LedgerMode};
    use crate::store::{tests::SAMPLE, LedgerStore};
    use doodlify_core::{EventStatus, ProgressPatch};

    #[test]
    fn project_and_defaults_merge_shallowly() {
        let base = Config::from_json_str(SAMPLE).unwrap();
        let ov = ConfigOverrides::from_json_str(
            r##"{"project":{"description":"From manifest","timeZone":"Europe/Paris"},
                "defaults":{"selector":"#app"}}"##,
        )
        .unwrap();
        let merged = ov.merge_into(&base).unwrap();
        assert_eq!(merged.project.name, "Acme");
        assert_eq!(merged.project.description, "From manifest");
        assert_eq!(merged.project.time_zone.as_deref(), Some("Europe/Paris"));
        assert_eq!(merged.defaults.selector.as_deref(), Some("#app"));
        assert_eq!(merged.defaults.branch_prefix.as_deref(), Some("feature/event/"));
        assert_eq!(merged.events.len(), 2);
    }

    #[test]
    fn events_replace_the_list() {
        let base = Config::from_json_str(SAMPLE).unwrap();
        let ov = ConfigOverrides::from_json_str(
            r#"{"events":[{"id":"easter","name":"Easter","startDate":"2025-04-01",
                "endDate":"2025-04-21","branch":"easter-2025"}]}"#,
        )
        .unwrap();
        let merged = ov.merge_into(&base).unwrap();
        assert_eq!(merged.events.len(), 1);
        assert_eq!(merged.events[0].id, "easter");
    }

    #[test]
    fn invalid_override_is_a_validation_error() {
        let base = Config::from_json_str(SAMPLE).unwrap();
        let ov = ConfigOverrides::from_json_str(
            r#"{"events":[{"id":"x","name":"X","startDate":"2025-05-01",
                "endDate":"2025-04-01","branch":"x"}]}"#,
        )
        .unwrap();
        assert!(matches!(ov.merge_into(&base), Err(Error::Validation(_))));

        let ov = ConfigOverrides::from_json_str(r#"{"project":{"sources":"not-a-list"}}"#).unwrap();
        assert!(matches!(ov.merge_into(&base), Err(Error::Validation(_))));
    }

    #[test]
    fn apply_overrides_mirrors_into_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_json_str(SAMPLE).unwrap();
        let location =
            LedgerLocation::resolve(LedgerMode::InRepo, dir.path(), &dir.path().join("acme"));
        let mut store = LedgerStore::new(config, location);
        store
            .update_progress("christmas", ProgressPatch::status(EventStatus::Completed))
            .unwrap();

        let ov = ConfigOverrides::from_json_str(
            r#"{"project":{"targetBranch":"release"},"defaults":{"branchPrefix":"themes/"}}"#,
        )
        .unwrap();
        let lock = store.apply_overrides(&ov).unwrap();

        assert_eq!(store.config().base_branch(), "release");
        assert_eq!(lock.project.target_branch.as_deref(), Some("release"));
        assert_eq!(lock.defaults.branch_prefix.as_deref(), Some("themes/"));
        assert_eq!(lock.event("christmas").unwrap().progress.status, EventStatus::Completed);
        assert_eq!(store.load().unwrap().defaults.branch_prefix.as_deref(), Some("themes/"));
    }
}

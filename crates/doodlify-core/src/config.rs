use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Base branch used when the project does not name one.
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Suggestion kinds the analyzer knows about, with their default reporting policy.
const DEFAULT_REPORT_SUGGESTIONS: &[(&str, bool)] = &[
    ("i18n", false),
    ("css_variables", true),
    ("data_attrs", true),
    ("svg_usage", true),
    ("global_css", true),
    ("marker_styles", true),
    ("favicon_variants", true),
    ("favicon_establish", true),
    ("og_variants", true),
    ("og_add", true),
    ("selectors_guidance", true),
    ("ai_considerations", true),
];

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Source-root hints, in priority order.
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_branch: Option<String>,
    /// IANA zone used to decide which calendar day "today" is. UTC when absent or invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Policies shared by every event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_prefix: Option<String>,
    #[serde(default)]
    pub use_event_color_palette: bool,
    /// Suggestion kind → whether it is filed as an issue.
    #[serde(default = "default_report_suggestions")]
    pub report_suggestions: BTreeMap<String, bool>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            selector: None,
            branch_prefix: None,
            use_event_color_palette: false,
            report_suggestions: default_report_suggestions(),
        }
    }
}

fn default_report_suggestions() -> BTreeMap<String, bool> {
    DEFAULT_REPORT_SUGGESTIONS
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect()
}

impl DefaultsConfig {
    /// Whether suggestions of `kind` should be filed. Unknown kinds are not.
    pub fn reports(&self, kind: &str) -> bool {
        self.report_suggestions.get(kind).copied().unwrap_or(false)
    }
}

/// A named, dated theme. Declared once; progress lives in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: Date,
    /// Inclusive.
    pub end_date: Date,
    /// Branch suffix; the full name is `defaults.branchPrefix + branch`.
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_event_color_palette: Option<bool>,
}

/// The declarative configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub project: ProjectConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub events: Vec<EventConfig>,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read configuration {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(content).map_err(|e| Error::Validation(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            return Err(Error::Validation("project.name must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for event in &self.events {
            if event.id.trim().is_empty() {
                return Err(Error::Validation("event id must not be empty".into()));
            }
            if !seen.insert(event.id.as_str()) {
                return Err(Error::Validation(format!(
                    "duplicate event id \"{}\"",
                    event.id
                )));
            }
            if event.branch.trim().is_empty() {
                return Err(Error::Validation(format!(
                    "event \"{}\" has an empty branch",
                    event.id
                )));
            }
            if event.start_date > event.end_date {
                return Err(Error::Validation(format!(
                    "event \"{}\" starts ({}) after it ends ({})",
                    event.id, event.start_date, event.end_date
                )));
            }
        }
        if let Some(tz) = self.project.time_zone.as_deref() {
            if jiff::tz::TimeZone::get(tz).is_err() {
                tracing::warn!(time_zone = tz, "unknown project time zone, falling back to UTC");
            }
        }
        Ok(())
    }

    pub fn event(&self, id: &str) -> Option<&EventConfig> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn base_branch(&self) -> &str {
        self.project
            .target_branch
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_BRANCH)
    }

    /// Full branch name for an event: prefix + suffix.
    pub fn branch_name(&self, event: &EventConfig) -> String {
        branch_name(&self.defaults, event)
    }
}

pub fn branch_name(defaults: &DefaultsConfig, event: &EventConfig) -> String {
    format!(
        "{}{}",
        defaults.branch_prefix.as_deref().unwrap_or(""),
        event.branch
    )
}

//! Pattern matching over frontend sources: image references, selectors.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Upper bound on extracted selectors, and on markup files sampled for them.
pub const MAX_SELECTORS: usize = 50;

static IMAGE_REFS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Quoted paths: imports, src/href attributes
        Regex::new(r#"(?i)["']([^"']*\.(?:png|jpg|jpeg|gif|svg|webp|ico))["']"#).unwrap(),
        // CSS url(...)
        Regex::new(r#"(?i)url\(["']?([^"'()]*\.(?:png|jpg|jpeg|gif|svg|webp|ico))["']?\)"#).unwrap(),
    ]
});

static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\b(?:className|class)=["']([^"']+)["']"#).unwrap());

static ID_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bid=["']([^"']+)["']"#).unwrap());

static SELECTOR_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.([A-Za-z0-9_-]+)").unwrap());
static SELECTOR_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#([A-Za-z0-9_-]+)").unwrap());
static SELECTOR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s>+~,])([a-z][a-z0-9]*)").unwrap());

/// Image paths referenced from source text. External URLs, data URIs and
/// template expressions are dropped; the rest are normalized.
pub fn image_references(content: &str) -> Vec<String> {
    let mut refs = Vec::new();
    for re in IMAGE_REFS.iter() {
        for cap in re.captures_iter(content) {
            let raw = &cap[1];
            if raw.contains("://") || raw.starts_with("//") || raw.starts_with("data:") || raw.contains('{') {
                continue;
            }
            let normalized = doodlify_files::normalize(raw);
            if !normalized.is_empty() {
                refs.push(normalized);
            }
        }
    }
    refs
}

/// Class and id selectors declared in markup, `.name` / `#name`, skipping
/// names of two characters or fewer.
pub fn declared_selectors(content: &str, into: &mut BTreeSet<String>) {
    for cap in CLASS_ATTR.captures_iter(content) {
        for class in cap[1].split_whitespace().filter(|c| c.len() > 2) {
            into.insert(format!(".{class}"));
        }
    }
    for cap in ID_ATTR.captures_iter(content) {
        let id = cap[1].trim();
        if id.len() > 2 && !id.contains(char::is_whitespace) {
            into.insert(format!("#{id}"));
        }
    }
}

/// Loose matcher for a CSS selector against markup source: a file matches if
/// it mentions any class, id or tag named in the selector.
#[derive(Debug)]
pub struct SelectorMatcher {
    patterns: Vec<Regex>,
}

impl SelectorMatcher {
    pub fn new(selector: &str) -> Result<Self, regex::Error> {
        let mut patterns = Vec::new();
        for cap in SELECTOR_CLASS.captures_iter(selector) {
            let name = regex::escape(&cap[1]);
            patterns.push(Regex::new(&format!(
                r#"\b(?:className|class)=["'](?:[^"']*\s)?{name}(?:\s[^"']*)?["']"#
            ))?);
        }
        for cap in SELECTOR_ID.captures_iter(selector) {
            let name = regex::escape(&cap[1]);
            patterns.push(Regex::new(&format!(r#"\bid=["']{name}["']"#))?);
        }
        for cap in SELECTOR_TAG.captures_iter(selector) {
            let tag = regex::escape(&cap[1]);
            patterns.push(Regex::new(&format!(r"(?i)<{tag}[\s>/]"))?);
        }
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_match(&self, content: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(content))
    }
}

use std::fs;

use anyhow::{anyhow, bail, Context, Result};
use doodlify_conductor::{TextAdapter, ThemeRequest};
use doodlify_core::{write_atomic, Error};
use serde_json::{json, Value};

use crate::client::OpenAiClient;

const SYSTEM_PROMPT: &str = "You are a professional copywriter specializing in event-themed content.";

/// Key segments that mark a value as technical rather than user-facing.
const TECHNICAL_KEYS: &[&str] = &["id", "key", "code", "url", "path", "api", "endpoint"];

/// Strings this short are labels or codes, not copy.
const MIN_ADAPT_LEN: usize = 4;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub attempted: usize,
    pub adapted: usize,
    pub failed: usize,
}

/// Split a key into lowercase words at `_`, `-`, `.` and camelCase humps.
fn key_segments(key: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in key.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

pub fn is_technical_key(key: &str) -> bool {
    key_segments(key)
        .iter()
        .any(|s| TECHNICAL_KEYS.contains(&s.as_str()))
}

/// Rewrite every user-facing string in `value` through `adapt`, in place.
///
/// `adapt` receives the dotted key path and the original text. A failed
/// string keeps its original value.
pub fn adapt_strings<F>(value: &mut Value, adapt: &mut F) -> WalkStats
where
    F: FnMut(&str, &str) -> Result<String>,
{
    let mut stats = WalkStats::default();
    walk(value, "", adapt, &mut stats);
    stats
}

fn walk<F>(value: &mut Value, path: &str, adapt: &mut F, stats: &mut WalkStats)
where
    F: FnMut(&str, &str) -> Result<String>,
{
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if child.is_string() && is_technical_key(key) {
                    continue;
                }
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                walk(child, &child_path, adapt, stats);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter_mut().enumerate() {
                walk(child, &format!("{path}[{i}]"), adapt, stats);
            }
        }
        Value::String(text) if text.chars().count() >= MIN_ADAPT_LEN => {
            stats.attempted += 1;
            match adapt(path, text) {
                Ok(adapted) => {
                    *text = adapted;
                    stats.adapted += 1;
                }
                Err(e) => {
                    tracing::warn!(key = %path, error = %format!("{e:#}"), "keeping original text");
                    stats.failed += 1;
                }
            }
        }
        _ => {}
    }
}

/// Drop one pair of wrapping double quotes the model sometimes adds.
pub(crate) fn unquote(text: &str) -> &str {
    let t = text.trim();
    t.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(t)
}

pub(crate) fn adaptation_prompt(original: &str, key_path: &str, req: &ThemeRequest<'_>) -> String {
    format!(
        "You are adapting website text content for a special event: {name}.\n\n\
         Event description: {desc}\n\n\
         Original text: \"{original}\"\n\n\
         Context: key {key_path}\n\n\
         Instructions:\n\
         - Adapt the text to reflect the event theme while keeping its core message\n\
         - Keep the tone professional and appropriate\n\
         - Keep the same language as the original\n\
         - Keep the length similar to the original\n\
         - Output only the adapted text",
        name = req.event_name,
        desc = req.event_description.trim(),
    )
}

pub(crate) fn completion_text(response: &Value) -> Result<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| unquote(s).to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("completion carried no text"))
}

impl OpenAiClient {
    fn adapt_text(&self, text: &str, key_path: &str, req: &ThemeRequest<'_>) -> Result<String> {
        let body = json!({
            "model": self.text_model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": adaptation_prompt(text, key_path, req) },
            ],
            "temperature": 0.7,
            "max_completion_tokens": 500,
        });
        completion_text(&self.post_json("chat/completions", &body)?)
    }
}

impl TextAdapter for OpenAiClient {
    fn adapt(&self, req: &ThemeRequest<'_>) -> Result<()> {
        let path = req.path;
        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()).into());
        }
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if !is_json {
            bail!("unsupported text format: {}", path.display());
        }
        let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let mut doc: Value =
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;

        let stats = adapt_strings(&mut doc, &mut |key_path, text| self.adapt_text(text, key_path, req));
        tracing::debug!(file = %path.display(), ?stats, "text adaptation finished");
        if stats.attempted > 0 && stats.adapted == 0 {
            bail!("none of {} strings could be adapted", stats.attempted);
        }
        if stats.adapted == 0 {
            return Ok(());
        }
        let mut out = serde_json::to_string_pretty(&doc)?;
        out.push('\n');
        write_atomic(path, out.as_bytes()).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

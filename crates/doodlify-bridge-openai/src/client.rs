use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o";

/// Image edits routinely take a minute or more.
const TIMEOUT: Duration = Duration::from_secs(300);

/// Base64 image payloads exceed ureq's default body limit.
const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;

/// Blocking OpenAI HTTP client shared by the image and text capabilities.
pub struct OpenAiClient {
    agent: ureq::Agent,
    api_key: String,
    base_url: String,
    pub(crate) image_model: String,
    pub(crate) text_model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    pub(crate) fn post_json(&self, endpoint: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .agent
            .post(&self.url(endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send(body.to_string())
            .with_context(|| format!("POST {endpoint}"))?;
        read_response(endpoint, response)
    }

    pub(crate) fn post_multipart(&self, endpoint: &str, form: &Multipart) -> Result<serde_json::Value> {
        let response = self
            .agent
            .post(&self.url(endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", form.content_type())
            .send(&form.body[..])
            .with_context(|| format!("POST {endpoint}"))?;
        read_response(endpoint, response)
    }
}

fn read_response(endpoint: &str, mut response: ureq::http::Response<ureq::Body>) -> Result<serde_json::Value> {
    let status = response.status().as_u16();
    let text = response
        .body_mut()
        .with_config()
        .limit(MAX_RESPONSE_BYTES)
        .read_to_string()
        .with_context(|| format!("reading {endpoint} response"))?;
    if !(200..300).contains(&status) {
        bail!("{endpoint} returned HTTP {status}: {}", api_error_message(&text));
    }
    serde_json::from_str(&text).with_context(|| format!("decoding {endpoint} response"))
}

/// The `error.message` of an API error body, or the raw body.
pub(crate) fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().chars().take(300).collect())
}

// ── Multipart ──

/// A `multipart/form-data` body assembled in memory.
pub(crate) struct Multipart {
    boundary: String,
    body: Vec<u8>,
}

impl Multipart {
    pub fn new(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.open_part(&format!("Content-Disposition: form-data; name=\"{}\"\r\n", field(name)));
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(mut self, name: &str, filename: &str, mime: &str, data: &[u8]) -> Self {
        self.open_part(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {mime}\r\n",
            field(name),
            field(filename)
        ));
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Self {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    fn open_part(&mut self, headers: &str) {
        self.body
            .extend_from_slice(format!("--{}\r\n{headers}\r\n", self.boundary).as_bytes());
    }

    #[cfg(test)]
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }
}

/// A quoted `Content-Disposition` value: quotes and line breaks are
/// percent-encoded the way browsers encode form field names.
fn field(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("%22"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            c => out.push(c),
        }
    }
    out
}

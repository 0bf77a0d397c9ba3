use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, bail, Context, Result};
use base64::Engine;
use doodlify_conductor::{ImageTransformer, ThemeRequest};
use doodlify_core::{write_atomic, Error};

use crate::client::{Multipart, OpenAiClient};

pub(crate) fn image_prompt(req: &ThemeRequest<'_>) -> String {
    let name = req.event_name;
    let palette = if req.use_color_palette {
        format!("- Use the traditional {name} color palette instead of the image's current colors")
    } else {
        "- Keep the image's existing color palette, only adding accents that evoke the theme".to_string()
    };
    format!(
        "Generate a new flat 2D illustration version of the image that adapts it for {name}.\n\
         {}\n\n\
         Instructions:\n\
         - Maintain the core composition and subject matter of the original image\n\
         - Add thematic elements related to {name}\n\
         - Keep the style consistent with the original\n\
         {palette}\n\
         - Ensure the result is professional and high-quality\n\
         - Preserve any existing transparency (alpha channel) exactly as in the original\n\
         - Do not introduce a checkerboard or solid fill where transparency exists",
        req.event_description.trim()
    )
}

pub(crate) fn mime_type(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Decoded bytes of the first image in an `images/*` response.
pub(crate) fn decode_image(response: &serde_json::Value) -> Result<Vec<u8>> {
    let encoded = response["data"][0]["b64_json"]
        .as_str()
        .ok_or_else(|| anyhow!("response carried no image data"))?;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("decoding base64 image")
}

fn boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("doodlify-{nanos:x}")
}

impl ImageTransformer for OpenAiClient {
    fn transform(&self, req: &ThemeRequest<'_>) -> Result<()> {
        let path = req.path;
        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()).into());
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let Some(mime) = mime_type(ext) else {
            bail!("unsupported image format: {}", path.display());
        };
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image");
        let original = fs::read(path).with_context(|| format!("reading {}", path.display()))?;

        let form = Multipart::new(boundary())
            .text("model", &self.image_model)
            .text("prompt", &image_prompt(req))
            .file("image", filename, mime, &original)
            .finish();
        tracing::debug!(file = %path.display(), model = %self.image_model, "requesting image edit");
        let response = self.post_multipart("images/edits", &form)?;
        let themed = decode_image(&response)?;
        write_atomic(path, &themed).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

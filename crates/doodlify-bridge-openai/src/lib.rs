//! OpenAI implementations of the image-transform and text-adaptation
//! capabilities. Both rewrite the file in place with an atomic write.

pub mod client;
pub mod image;
pub mod text;

pub use client::{OpenAiClient, DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
pub use text::{adapt_strings, is_technical_key, WalkStats};

use async_trait::async_trait;
use bytes::Bytes;

use omnix_core::Result;

pub mod audio;
pub mod image;
pub mod mime_detect;

pub use audio::{ElevenLabsStt, WhisperStt};
pub use image::GatewayImageGenerator;
pub use mime_detect::{detect_mime_type, extension_for, is_audio, is_image, sniff_audio_mime, sniff_image_mime};

/// Raw media received from a client.
#[derive(Debug, Clone)]
pub struct MediaPayload {
    /// Declared MIME type, if the client sent one.
    pub mime_type: Option<String>,
    pub data: Bytes,
}

impl MediaPayload {
    pub fn new(data: Bytes) -> Self {
        Self {
            mime_type: None,
            data,
        }
    }

    pub fn with_mime_type(mut self, mime_type: Option<String>) -> Self {
        self.mime_type = mime_type;
        self
    }
}

/// Turns recorded speech into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &str;

    async fn transcribe(&self, payload: &MediaPayload) -> Result<String>;
}

/// Produces an image URL (remote or `data:` URI) from a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// `reference` is an optional image to edit instead of generating from scratch.
    async fn generate(&self, prompt: &str, reference: Option<&str>) -> Result<String>;
}

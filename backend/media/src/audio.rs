use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use omnix_core::{OmnixError, Result};

use crate::mime_detect::{extension_for, sniff_audio_mime};
use crate::{MediaPayload, Transcriber};

#[derive(Deserialize)]
struct TranscriptBody {
    #[serde(default)]
    text: String,
}

/// Upload `payload` as a multipart `file` field and read back `{text}`.
async fn post_audio(
    provider: &str,
    request: reqwest::RequestBuilder,
    form: Form,
    payload: &MediaPayload,
) -> Result<String> {
    let mime = payload
        .mime_type
        .as_deref()
        .or_else(|| sniff_audio_mime(&payload.data))
        .unwrap_or("audio/webm");
    let part = Part::bytes(payload.data.to_vec())
        .file_name(format!("audio.{}", extension_for(mime)))
        .mime_str(mime)
        .map_err(|e| OmnixError::validation(format!("invalid audio MIME type {mime}: {e}")))?;

    info!(
        provider,
        bytes = payload.data.len(),
        mime,
        "Transcribing audio payload"
    );

    let response = request
        .multipart(form.part("file", part))
        .send()
        .await
        .map_err(|e| OmnixError::transport(format!("{provider} STT request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(provider, status = status.as_u16(), "STT provider returned an error");
        return Err(OmnixError::upstream(status.as_u16(), body));
    }

    let body: TranscriptBody = response
        .json()
        .await
        .map_err(|e| OmnixError::upstream(status.as_u16(), format!("invalid transcript body: {e}")))?;
    Ok(body.text)
}

/// ElevenLabs speech-to-text (`scribe_v1`).
pub struct ElevenLabsStt {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ElevenLabsStt {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: "scribe_v1".to_string(),
            base_url: "https://api.elevenlabs.io/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Transcriber for ElevenLabsStt {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn transcribe(&self, payload: &MediaPayload) -> Result<String> {
        let request = self
            .client
            .post(format!("{}/speech-to-text", self.base_url))
            .header("xi-api-key", &self.api_key);
        let form = Form::new().text("model_id", self.model.clone());
        post_audio("elevenlabs", request, form, payload).await
    }
}

/// OpenAI Whisper transcription.
pub struct WhisperStt {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl WhisperStt {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Transcriber for WhisperStt {
    fn name(&self) -> &str {
        "openai"
    }

    async fn transcribe(&self, payload: &MediaPayload) -> Result<String> {
        let request = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key);
        let form = Form::new().text("model", self.model.clone());
        post_audio("openai", request, form, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn clip() -> MediaPayload {
        MediaPayload::new(Bytes::from_static(&[0x1A, 0x45, 0xDF, 0xA3, 0, 0, 0, 0]))
    }

    #[tokio::test]
    async fn elevenlabs_returns_transcript_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/speech-to-text"))
            .and(header("xi-api-key", "el-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "hello world",
                "language_code": "en"
            })))
            .mount(&server)
            .await;

        let stt = ElevenLabsStt::new("el-key").with_base_url(server.uri());
        assert_eq!(stt.transcribe(&clip()).await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn whisper_error_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(400).set_body_string("unsupported format"))
            .mount(&server)
            .await;

        let stt = WhisperStt::new("sk", "whisper-1").with_base_url(server.uri());
        let err = stt.transcribe(&clip()).await.unwrap_err();
        assert_eq!(err.upstream_status(), Some(400));
    }
}

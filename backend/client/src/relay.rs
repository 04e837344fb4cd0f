//! HTTP transport to the relay and its one-shot proxy endpoints.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use omnix_core::{
    ErrorEnvelope, ImageRequest, ImageResponse, OmnixError, Result, SpeechRequest, SpeechResponse,
    TranscriptionRequest, TranscriptionResponse,
};

pub const CHAT_PATH: &str = "/v1/ai-chat";
pub const SPEECH_PATH: &str = "/v1/text-to-speech";
pub const TRANSCRIPTION_PATH: &str = "/v1/speech-to-text";
pub const IMAGE_PATH: &str = "/v1/generate-image";
pub const HEALTH_PATH: &str = "/api/health";

/// Supplies the bearer credential attached to relay calls.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Current access token, or `None` to send the request unauthenticated.
    async fn access_token(&self) -> Result<Option<String>>;
}

/// A fixed token, e.g. from config or the environment.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

#[async_trait]
impl CredentialSource for StaticToken {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

/// Connection to one relay deployment.
#[derive(Clone)]
pub struct RelayClient {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: Arc::new(StaticToken::default()),
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST `body` and return the response once its status is a success.
    /// Relay failures arrive as `{error}` with status 500 and become
    /// transport errors carrying that message.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response> {
        let mut request = self.http.post(self.endpoint(path)).json(body);
        if let Some(token) = self.credentials.access_token().await? {
            request = request.bearer_auth(token);
        }

        debug!(path, "Calling relay");
        let response = request
            .send()
            .await
            .map_err(|e| OmnixError::transport(format!("relay request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|envelope| envelope.error)
            .unwrap_or(text);
        warn!(path, status = status.as_u16(), "Relay returned an error");
        Err(OmnixError::transport(format!(
            "relay returned {}: {}",
            status.as_u16(),
            message
        )))
    }

    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.post(path, body)
            .await?
            .json()
            .await
            .map_err(|e| OmnixError::transport(format!("unreadable relay response: {e}")))
    }

    /// Transcribe recorded audio through the relay.
    pub async fn transcribe(&self, audio: &[u8], mime_type: Option<&str>) -> Result<String> {
        let request = TranscriptionRequest {
            audio: STANDARD.encode(audio),
            mime_type: mime_type.map(str::to_string),
        };
        let response: TranscriptionResponse = self.post_json(TRANSCRIPTION_PATH, &request).await?;
        Ok(response.text)
    }

    /// Synthesize speech; returns the decoded audio bytes.
    pub async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<Bytes> {
        let request = SpeechRequest {
            text: text.to_string(),
            voice_id: voice_id.map(str::to_string),
        };
        let response: SpeechResponse = self.post_json(SPEECH_PATH, &request).await?;
        STANDARD
            .decode(response.audio_content)
            .map(Bytes::from)
            .map_err(|e| OmnixError::Parse(format!("audioContent is not base64: {e}")))
    }

    pub async fn generate_image(&self, prompt: &str, reference: Option<&str>) -> Result<ImageResponse> {
        let request = ImageRequest {
            prompt: prompt.to_string(),
            image_url: reference.map(str::to_string),
        };
        self.post_json(IMAGE_PATH, &request).await
    }

    /// Relay health report.
    pub async fn health(&self) -> Result<Value> {
        let response = self
            .http
            .get(self.endpoint(HEALTH_PATH))
            .send()
            .await
            .map_err(|e| OmnixError::transport(format!("relay unreachable: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(OmnixError::transport(format!("health check returned {}", status.as_u16())));
        }
        response
            .json()
            .await
            .map_err(|e| OmnixError::transport(format!("unreadable health report: {e}")))
    }
}

/// TTS provider trait and implementations (ElevenLabs + OpenAI TTS).
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use tracing::{info, warn};

use omnix_core::{OmnixError, Result};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Both providers are asked for MP3, the format the voice proxy returns.
const MP3_MIME: &str = "audio/mpeg";

/// A TTS request.
#[derive(Debug, Clone, Default)]
pub struct TtsRequest {
    pub text: String,
    pub voice: Option<String>,
}

impl TtsRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
        }
    }

    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice;
        self
    }
}

/// Returns raw audio bytes.
#[async_trait]
pub trait TtsProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, req: TtsRequest) -> Result<Bytes>;
}

/// Send a provider request, turning failures into relay errors.
async fn fetch_audio(provider: &str, request: RequestBuilder) -> Result<Bytes> {
    let response = request
        .send()
        .await
        .map_err(|e| OmnixError::transport(format!("{provider} TTS request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(provider, status = status.as_u16(), "TTS provider returned an error");
        return Err(OmnixError::upstream(status.as_u16(), body));
    }

    response
        .bytes()
        .await
        .map_err(|e| OmnixError::transport(format!("{provider} TTS body read failed: {e}")))
}

// ---------------------------------------------------------------------------
// OpenAI TTS
// ---------------------------------------------------------------------------

pub struct OpenAiTts {
    api_key: String,
    model: String,
    default_voice: String,
    base_url: String,
    client: Client,
}

impl OpenAiTts {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "tts-1".to_string(),
            default_voice: "nova".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = voice.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct OpenAiTtsBody {
    model: String,
    input: String,
    voice: String,
    response_format: &'static str,
}

#[async_trait]
impl TtsProvider for OpenAiTts {
    fn name(&self) -> &str {
        "openai"
    }

    async fn synthesize(&self, req: TtsRequest) -> Result<Bytes> {
        let body = OpenAiTtsBody {
            model: self.model.clone(),
            input: req.text,
            voice: req.voice.unwrap_or_else(|| self.default_voice.clone()),
            response_format: "mp3",
        };
        info!("[TTS/OpenAI] Synthesizing with model={}", body.model);
        let request = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);
        fetch_audio("openai", request).await
    }
}

// ---------------------------------------------------------------------------
// ElevenLabs TTS
// ---------------------------------------------------------------------------

pub struct ElevenLabsTts {
    api_key: String,
    default_voice_id: String,
    model_id: String,
    base_url: String,
    client: Client,
}

impl ElevenLabsTts {
    pub fn new(api_key: String, voice_id: Option<String>) -> Self {
        Self {
            api_key,
            default_voice_id: voice_id.unwrap_or_else(|| "21m00Tcm4TlvDq8ikWAM".to_string()), // Rachel
            model_id: "eleven_multilingual_v2".to_string(),
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ElevenLabsBody {
    text: String,
    model_id: String,
    voice_settings: ElevenLabsVoiceSettings,
}

#[derive(Serialize)]
struct ElevenLabsVoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[async_trait]
impl TtsProvider for ElevenLabsTts {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(&self, req: TtsRequest) -> Result<Bytes> {
        let voice_id = req.voice.as_deref().unwrap_or(&self.default_voice_id);
        let url = format!("{}/text-to-speech/{}", self.base_url, voice_id);
        let body = ElevenLabsBody {
            text: req.text.clone(),
            model_id: self.model_id.clone(),
            voice_settings: ElevenLabsVoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
            },
        };
        info!("[TTS/ElevenLabs] Synthesizing voice_id={}", voice_id);
        let request = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("accept", MP3_MIME)
            .json(&body);
        fetch_audio("elevenlabs", request).await
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

pub enum TtsProviderKind {
    OpenAi { api_key: String, voice: Option<String> },
    ElevenLabs { api_key: String, voice_id: Option<String> },
}

pub fn create_tts(kind: TtsProviderKind) -> Box<dyn TtsProvider> {
    match kind {
        TtsProviderKind::OpenAi { api_key, voice } => {
            let tts = OpenAiTts::new(api_key);
            match voice {
                Some(voice) => Box::new(tts.with_voice(voice)),
                None => Box::new(tts),
            }
        }
        TtsProviderKind::ElevenLabs { api_key, voice_id } => {
            Box::new(ElevenLabsTts::new(api_key, voice_id))
        }
    }
}

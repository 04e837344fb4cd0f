//! `omnix serve`: wire configured providers into the relay and listen.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use omnix_config::defaults::{DEFAULT_STT_PROVIDER, DEFAULT_TTS_PROVIDER};
use omnix_config::OmnixConfig;
use omnix_core::{ChatUpstream, ModePreambles};
use omnix_gateway::{start_server, GatewayState};
use omnix_media::{ElevenLabsStt, GatewayImageGenerator, ImageGenerator, Transcriber, WhisperStt};
use omnix_providers::{preset_base_url, OpenAiCompatProvider};
use omnix_tts::{create_tts, TtsProvider, TtsProviderKind};

pub async fn run(config: OmnixConfig) -> Result<()> {
    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.listen_addr()))?;

    info!(addr = %addr, provider = config.chat_provider(), model = config.chat_model(), "Starting OMNIX relay");
    start_server(addr, build_state(&config)).await
}

/// Build the relay state. Providers without credentials are left out so their
/// endpoints answer with a configuration error instead of failing upstream.
pub fn build_state(config: &OmnixConfig) -> GatewayState {
    let mut state = GatewayState::new(ModePreambles::with_overrides(config.modes.clone()));

    if let Some(chat) = chat_upstream(config) {
        state = state.with_chat(chat);
    }
    if let Some(tts) = speech_provider(config) {
        state = state.with_tts(tts);
    }
    if let Some(stt) = transcriber(config) {
        state = state.with_stt(stt);
    }
    if let Some(images) = image_generator(config) {
        state = state.with_images(images);
    }
    state
}

fn chat_upstream(config: &OmnixConfig) -> Option<Arc<dyn ChatUpstream>> {
    let provider = config.chat_provider();
    // Local Ollama runs without a key.
    let api_key = match config.chat_api_key() {
        Some(key) => key.to_string(),
        None if provider == "ollama" => String::new(),
        None => {
            warn!(provider, "No chat API key configured; /v1/ai-chat will be unavailable");
            return None;
        }
    };

    let base_url = config
        .chat
        .as_ref()
        .and_then(|c| c.base_url.clone())
        .or_else(|| preset_base_url(provider).map(str::to_string));
    let Some(base_url) = base_url else {
        warn!(provider, "Unknown chat provider and no baseUrl set");
        return None;
    };

    let upstream = OpenAiCompatProvider::new(api_key)
        .with_name(provider)
        .with_base_url(base_url)
        .with_model(config.chat_model())
        .with_max_tokens(config.chat_max_tokens())
        .with_temperature(config.chat_temperature());
    Some(Arc::new(upstream))
}

fn voice_key(config: &OmnixConfig) -> Option<String> {
    config
        .voice
        .as_ref()
        .and_then(|v| v.api_key.clone())
        .filter(|key| !key.is_empty())
}

fn speech_provider(config: &OmnixConfig) -> Option<Arc<dyn TtsProvider>> {
    let voice = config.voice.clone().unwrap_or_default();
    let kind = match voice.tts_provider.as_deref().unwrap_or(DEFAULT_TTS_PROVIDER) {
        "openai" => TtsProviderKind::OpenAi {
            api_key: config.chat_api_key()?.to_string(),
            voice: voice.voice_id,
        },
        _ => TtsProviderKind::ElevenLabs {
            api_key: voice_key(config)?,
            voice_id: voice.voice_id,
        },
    };
    Some(Arc::from(create_tts(kind)))
}

fn transcriber(config: &OmnixConfig) -> Option<Arc<dyn Transcriber>> {
    let voice = config.voice.clone().unwrap_or_default();
    match voice.stt_provider.as_deref().unwrap_or(DEFAULT_STT_PROVIDER) {
        "openai" => {
            let model = voice.stt_model.unwrap_or_else(|| "whisper-1".to_string());
            Some(Arc::new(WhisperStt::new(config.chat_api_key()?, model)))
        }
        _ => Some(Arc::new(ElevenLabsStt::new(voice_key(config)?))),
    }
}

fn image_generator(config: &OmnixConfig) -> Option<Arc<dyn ImageGenerator>> {
    let image = config.image.clone()?;
    let api_key = image.api_key.filter(|key| !key.is_empty())?;

    let mut generator = GatewayImageGenerator::new(api_key);
    if let Some(url) = image.base_url {
        generator = generator.with_base_url(url);
    }
    if let Some(model) = image.model {
        generator = generator.with_model(model);
    }
    Some(Arc::new(generator))
}

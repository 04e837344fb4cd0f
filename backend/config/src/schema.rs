//! OMNIX runtime configuration schema.
//!
//! Every field is optional in the file; `apply_all_defaults` fills the gaps
//! and the accessor methods fall back to the same defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::defaults::{
    DEFAULT_BIND, DEFAULT_CHAT_PROVIDER, DEFAULT_CHUNK_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_PORT, DEFAULT_RELAY_URL, DEFAULT_TEMPERATURE,
};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OmnixConfig {
    /// Relay listener
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Chat-completion upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatConfig>,

    /// Speech synthesis and transcription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceConfig>,

    /// Image generation gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageConfig>,

    /// Instruction overrides keyed by mode tag
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub modes: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Terminal client settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientConfig>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfig {
    /// Provider id: "openai", "openrouter", "lovable", "ollama"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Overrides the provider's preset base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    /// "elevenlabs" | "openai"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts_provider: Option<String>,
    /// "elevenlabs" | "openai"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stt_provider: Option<String>,
    /// ElevenLabs key. OpenAI voice providers reuse `chat.apiKey`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stt_model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for daily NDJSON log files; console only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_url: Option<String>,
    /// Bearer credential sent to the relay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    /// Idle timeout between stream chunks; 0 disables it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl OmnixConfig {
    /// `bind:port` the relay listens on.
    pub fn listen_addr(&self) -> String {
        let server = self.server.clone().unwrap_or_default();
        format!(
            "{}:{}",
            server.bind.as_deref().unwrap_or(DEFAULT_BIND),
            server.port.unwrap_or(DEFAULT_PORT)
        )
    }

    pub fn chat_provider(&self) -> &str {
        self.chat
            .as_ref()
            .and_then(|c| c.provider.as_deref())
            .unwrap_or(DEFAULT_CHAT_PROVIDER)
    }

    /// Non-empty chat API key, if one is configured.
    pub fn chat_api_key(&self) -> Option<&str> {
        self.chat
            .as_ref()
            .and_then(|c| c.api_key.as_deref())
            .filter(|key| !key.is_empty())
    }

    pub fn chat_model(&self) -> &str {
        self.chat
            .as_ref()
            .and_then(|c| c.model.as_deref())
            .unwrap_or(DEFAULT_MODEL)
    }

    pub fn chat_max_tokens(&self) -> u32 {
        self.chat
            .as_ref()
            .and_then(|c| c.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn chat_temperature(&self) -> f32 {
        self.chat
            .as_ref()
            .and_then(|c| c.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Directory for rolling log files, if file logging is enabled.
    pub fn logging_dir(&self) -> Option<PathBuf> {
        self.logging
            .as_ref()
            .and_then(|l| l.dir.as_deref())
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
    }

    pub fn relay_url(&self) -> &str {
        self.client
            .as_ref()
            .and_then(|c| c.relay_url.as_deref())
            .unwrap_or(DEFAULT_RELAY_URL)
    }

    pub fn streaming_enabled(&self) -> bool {
        self.client.as_ref().and_then(|c| c.streaming).unwrap_or(true)
    }

    pub fn chunk_timeout_secs(&self) -> u64 {
        self.client
            .as_ref()
            .and_then(|c| c.chunk_timeout_secs)
            .unwrap_or(DEFAULT_CHUNK_TIMEOUT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
server:
  port: 9000
chat:
  provider: openrouter
  apiKey: sk-or-123
  maxTokens: 500
modes:
  code: Answer in Rust only.
client:
  chunkTimeoutSecs: 30
"#;
        let cfg: OmnixConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.listen_addr(), "127.0.0.1:9000");
        assert_eq!(cfg.chat_provider(), "openrouter");
        assert_eq!(cfg.chat_api_key(), Some("sk-or-123"));
        assert_eq!(cfg.chat_max_tokens(), 500);
        assert_eq!(cfg.modes["code"], "Answer in Rust only.");
        assert_eq!(cfg.chunk_timeout_secs(), 30);
    }

    #[test]
    fn accessors_fall_back_to_defaults() {
        let cfg = OmnixConfig::default();
        assert_eq!(cfg.chat_model(), "gpt-4o-mini");
        assert_eq!(cfg.chat_max_tokens(), 1000);
        assert!((cfg.chat_temperature() - 0.7).abs() < f32::EPSILON);
        assert!(cfg.chat_api_key().is_none());
        assert!(cfg.streaming_enabled());
    }
}

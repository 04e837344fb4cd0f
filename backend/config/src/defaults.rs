//! Config defaults: fills unset values after loading.

use crate::schema::{ChatConfig, ClientConfig, LoggingConfig, OmnixConfig, ServerConfig, VoiceConfig};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_CHAT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TTS_PROVIDER: &str = "elevenlabs";
pub const DEFAULT_STT_PROVIDER: &str = "elevenlabs";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:8787";
pub const DEFAULT_CHUNK_TIMEOUT_SECS: u64 = 60;

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: OmnixConfig) -> OmnixConfig {
    let config = apply_server_defaults(config);
    let config = apply_chat_defaults(config);
    let config = apply_voice_defaults(config);
    let config = apply_logging_defaults(config);
    apply_client_defaults(config)
}

fn apply_server_defaults(mut config: OmnixConfig) -> OmnixConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    config
}

fn apply_chat_defaults(mut config: OmnixConfig) -> OmnixConfig {
    let chat = config.chat.get_or_insert_with(ChatConfig::default);
    chat.provider.get_or_insert_with(|| DEFAULT_CHAT_PROVIDER.to_string());
    chat.model.get_or_insert_with(|| DEFAULT_MODEL.to_string());
    chat.max_tokens.get_or_insert(DEFAULT_MAX_TOKENS);
    chat.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    config
}

fn apply_voice_defaults(mut config: OmnixConfig) -> OmnixConfig {
    let voice = config.voice.get_or_insert_with(VoiceConfig::default);
    voice.tts_provider.get_or_insert_with(|| DEFAULT_TTS_PROVIDER.to_string());
    voice.stt_provider.get_or_insert_with(|| DEFAULT_STT_PROVIDER.to_string());
    config
}

fn apply_logging_defaults(mut config: OmnixConfig) -> OmnixConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    config
}

fn apply_client_defaults(mut config: OmnixConfig) -> OmnixConfig {
    let client = config.client.get_or_insert_with(ClientConfig::default);
    client.relay_url.get_or_insert_with(|| DEFAULT_RELAY_URL.to_string());
    client.streaming.get_or_insert(true);
    client.chunk_timeout_secs.get_or_insert(DEFAULT_CHUNK_TIMEOUT_SECS);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_chat_defaults() {
        let cfg = apply_all_defaults(OmnixConfig::default());
        let chat = cfg.chat.unwrap();
        assert_eq!(chat.model.as_deref(), Some(DEFAULT_MODEL));
        assert_eq!(chat.max_tokens, Some(DEFAULT_MAX_TOKENS));
        assert_eq!(chat.provider.as_deref(), Some("openai"));
    }

    #[test]
    fn does_not_override_user_values() {
        let mut cfg = OmnixConfig::default();
        cfg.server = Some(ServerConfig {
            port: Some(3000),
            ..Default::default()
        });
        let cfg = apply_all_defaults(cfg);
        let server = cfg.server.unwrap();
        assert_eq!(server.port, Some(3000));
        assert_eq!(server.bind.as_deref(), Some(DEFAULT_BIND));
    }
}

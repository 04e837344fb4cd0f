//! Config validation: collects errors and warnings in one pass.

use crate::schema::OmnixConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

const VOICE_PROVIDERS: &[&str] = &["elevenlabs", "openai"];

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &OmnixConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_chat(config, &mut report);
    validate_voice(config, &mut report);
    validate_modes(config, &mut report);
    validate_client(config, &mut report);
    report
}

fn validate_server(config: &OmnixConfig, report: &mut ValidationReport) {
    let Some(server) = &config.server else { return };
    if server.port == Some(0) {
        report.error("server.port", "port must be between 1 and 65535");
    }
}

/// A missing key is only a warning: the relay still starts and reports a
/// configuration error on each chat request.
fn validate_chat(config: &OmnixConfig, report: &mut ValidationReport) {
    if config.chat_api_key().is_none() && config.chat_provider() != "ollama" {
        report.warn(
            "chat.apiKey",
            "No chat API key configured; chat requests will fail until OPENAI_API_KEY is set",
        );
    }
    let Some(chat) = &config.chat else { return };
    if chat.max_tokens == Some(0) {
        report.error("chat.maxTokens", "maxTokens must be >= 1");
    }
    if let Some(t) = chat.temperature {
        if !(0.0..=2.0).contains(&t) {
            report.error("chat.temperature", format!("temperature {t} is outside 0.0..=2.0"));
        }
    }
}

fn validate_voice(config: &OmnixConfig, report: &mut ValidationReport) {
    let Some(voice) = &config.voice else { return };
    for (path, provider) in [
        ("voice.ttsProvider", &voice.tts_provider),
        ("voice.sttProvider", &voice.stt_provider),
    ] {
        if let Some(name) = provider {
            if !VOICE_PROVIDERS.contains(&name.as_str()) {
                report.error(
                    path,
                    format!("Unknown voice provider '{name}'. Use 'elevenlabs' or 'openai'"),
                );
            }
        }
    }
}

fn validate_modes(config: &OmnixConfig, report: &mut ValidationReport) {
    for (tag, text) in &config.modes {
        if text.trim().is_empty() {
            report.warn(format!("modes.{tag}"), "Empty instruction; the mode will have no guidance");
        }
    }
}

fn validate_client(config: &OmnixConfig, report: &mut ValidationReport) {
    let url = config.relay_url();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        report.error("client.relayUrl", format!("relayUrl '{url}' must start with http:// or https://"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ChatConfig, ServerConfig};

    #[test]
    fn default_config_is_valid_with_key_warning() {
        let report = validate(&OmnixConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert_eq!(report.warnings[0].path, "chat.apiKey");
    }

    #[test]
    fn zero_port_is_error() {
        let cfg = OmnixConfig {
            server: Some(ServerConfig {
                port: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "server.port");
    }

    #[test]
    fn out_of_range_temperature_is_error() {
        let cfg = OmnixConfig {
            chat: Some(ChatConfig {
                api_key: Some("sk".into()),
                temperature: Some(3.5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.errors.iter().any(|e| e.path == "chat.temperature"));
        assert!(report.warnings.is_empty());
    }
}

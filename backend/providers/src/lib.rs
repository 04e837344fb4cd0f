//! Upstream Provider Connectors.
//!
//! Chat-completion clients implementing `omnix_core::ChatUpstream`, and the
//! base URLs of the providers the relay knows by name.

pub mod mock;
pub mod openai;

pub use mock::MockUpstream;
pub use openai::OpenAiCompatProvider;

/// Default API base URL for the providers the relay knows by name.
pub fn preset_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "lovable" => Some("https://ai.gateway.lovable.dev/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_providers_have_presets() {
        assert_eq!(preset_base_url("openrouter"), Some("https://openrouter.ai/api/v1"));
        assert_eq!(preset_base_url("ollama"), Some("http://localhost:11434/v1"));
        assert_eq!(preset_base_url("custom"), None);
    }
}

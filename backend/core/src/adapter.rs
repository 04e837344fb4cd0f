//! Provider response-shape adapters.
//!
//! Each adapter knows where a provider puts the assistant text, both in
//! streamed event payloads and in complete responses. Parsers only talk to
//! the trait, so adding a provider does not touch the parsing loop.

use std::sync::Arc;

use serde_json::Value;

pub trait ResponseAdapter: Send + Sync {
    /// Provider identifier the adapter is registered under.
    fn provider(&self) -> &str;

    /// Text fragment carried by one streamed event payload.
    fn stream_delta<'a>(&self, event: &'a Value) -> Option<&'a str>;

    /// Assistant text of a complete (non-streaming) response.
    fn message_content<'a>(&self, body: &'a Value) -> Option<&'a str>;
}

/// OpenAI chat-completions shape, shared by OpenRouter and most gateways.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiAdapter;

impl ResponseAdapter for OpenAiAdapter {
    fn provider(&self) -> &str {
        "openai"
    }

    fn stream_delta<'a>(&self, event: &'a Value) -> Option<&'a str> {
        event.pointer("/choices/0/delta/content")?.as_str()
    }

    fn message_content<'a>(&self, body: &'a Value) -> Option<&'a str> {
        body.pointer("/choices/0/message/content")?.as_str()
    }
}

/// Anthropic messages shape (`content_block_delta` events).
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicAdapter;

impl ResponseAdapter for AnthropicAdapter {
    fn provider(&self) -> &str {
        "anthropic"
    }

    fn stream_delta<'a>(&self, event: &'a Value) -> Option<&'a str> {
        if event.get("type")?.as_str()? != "content_block_delta" {
            return None;
        }
        event.pointer("/delta/text")?.as_str()
    }

    fn message_content<'a>(&self, body: &'a Value) -> Option<&'a str> {
        body.pointer("/content/0/text")?.as_str()
    }
}

/// Adapter for `provider`. OpenAI-compatible is the fallback.
pub fn adapter_for(provider: &str) -> Arc<dyn ResponseAdapter> {
    match provider.to_ascii_lowercase().as_str() {
        "anthropic" => Arc::new(AnthropicAdapter),
        _ => Arc::new(OpenAiAdapter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn openai_delta_path() {
        let event = json!({"choices": [{"delta": {"content": "Hel"}}]});
        assert_eq!(OpenAiAdapter.stream_delta(&event), Some("Hel"));

        let role_only = json!({"choices": [{"delta": {"role": "assistant"}}]});
        assert_eq!(OpenAiAdapter.stream_delta(&role_only), None);
    }

    #[test]
    fn openai_message_path() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "Hi!"}}]});
        assert_eq!(OpenAiAdapter.message_content(&body), Some("Hi!"));
        assert_eq!(OpenAiAdapter.message_content(&json!({"choices": []})), None);
    }

    #[test]
    fn anthropic_ignores_non_delta_events() {
        let start = json!({"type": "message_start", "message": {}});
        let delta = json!({"type": "content_block_delta", "delta": {"type": "text_delta", "text": "yo"}});
        assert_eq!(AnthropicAdapter.stream_delta(&start), None);
        assert_eq!(AnthropicAdapter.stream_delta(&delta), Some("yo"));
    }

    #[test]
    fn registry_falls_back_to_openai() {
        assert_eq!(adapter_for("Anthropic").provider(), "anthropic");
        assert_eq!(adapter_for("openrouter").provider(), "openai");
        assert_eq!(adapter_for("").provider(), "openai");
    }
}

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::error::Result;
use crate::message::ChatMessage;

/// Raw provider bytes, forwarded chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Request to a chat-completion provider.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

/// Complete (non-streaming) answer of a provider.
#[derive(Debug, Clone)]
pub struct UpstreamCompletion {
    pub content: String,
    pub model: String,
    pub usage: Value,
}

/// A remote chat-completion endpoint.
///
/// Implementations must surface non-success statuses as `OmnixError::Upstream`
/// before returning from either method.
#[async_trait]
pub trait ChatUpstream: Send + Sync {
    /// Provider name (e.g., "openai", "openrouter").
    fn name(&self) -> &str;

    /// Model requested from the provider.
    fn model(&self) -> &str;

    /// Send the conversation and wait for the full answer.
    async fn complete(&self, request: &UpstreamRequest) -> Result<UpstreamCompletion>;

    /// Send the conversation with streaming enabled and hand back the raw body.
    async fn stream(&self, request: &UpstreamRequest) -> Result<ByteStream>;
}

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use omnix_core::{
    ByteStream, ChatMessage, ChatUpstream, OmnixError, OpenAiAdapter, ResponseAdapter, Result,
    UpstreamCompletion, UpstreamRequest,
};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Any provider speaking the OpenAI `/chat/completions` protocol
/// (OpenAI, OpenRouter, AI gateways, Ollama's `/v1`).
pub struct OpenAiCompatProvider {
    client: Client,
    name: String,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiCompatProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            name: "openai".to_string(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn send(&self, request: &UpstreamRequest) -> Result<Response> {
        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: request.stream,
        };

        debug!(
            provider = %self.name,
            model = %self.model,
            messages = request.messages.len(),
            stream = request.stream,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| OmnixError::transport(format!("{} request failed: {e}", self.name)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(provider = %self.name, status = status.as_u16(), "Upstream returned an error");
            return Err(OmnixError::upstream(status.as_u16(), error_body));
        }

        Ok(response)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[async_trait]
impl ChatUpstream for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &UpstreamRequest) -> Result<UpstreamCompletion> {
        let start = Instant::now();
        let request = UpstreamRequest {
            stream: false,
            ..request.clone()
        };

        let response = self.send(&request).await?;
        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .await
            .map_err(|e| OmnixError::upstream(status, format!("invalid JSON body: {e}")))?;

        let content = OpenAiAdapter
            .message_content(&body)
            .ok_or_else(|| {
                OmnixError::upstream(status, "response has no choices[0].message.content")
            })?
            .to_string();

        debug!(
            provider = %self.name,
            latency_ms = start.elapsed().as_millis() as u64,
            "Chat completion received"
        );

        Ok(UpstreamCompletion {
            content,
            model: self.model.clone(),
            usage: body.get("usage").cloned().unwrap_or(Value::Null),
        })
    }

    async fn stream(&self, request: &UpstreamRequest) -> Result<ByteStream> {
        let request = UpstreamRequest {
            stream: true,
            ..request.clone()
        };
        let response = self.send(&request).await?;

        Ok(response
            .bytes_stream()
            .map_err(|e| OmnixError::transport(format!("upstream stream failed: {e}")))
            .boxed())
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use omnix_core::{ChatMessage, ContentPart, MessageContent, OmnixError, Result};

use crate::ImageGenerator;

/// Image generation through a chat-completions gateway whose models can
/// answer with images (`modalities: ["image", "text"]`).
pub struct GatewayImageGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GatewayImageGenerator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: "google/gemini-2.5-flash-image-preview".to_string(),
            base_url: "https://ai.gateway.lovable.dev/v1".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ImageChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    modalities: [&'static str; 2],
}

/// Prompt alone, or prompt plus the reference image to edit.
fn prompt_content(prompt: &str, reference: Option<&str>) -> MessageContent {
    match reference {
        Some(url) => MessageContent::Parts(vec![
            ContentPart::text(prompt),
            ContentPart::image_url(url),
        ]),
        None => MessageContent::Text(prompt.to_string()),
    }
}

#[async_trait]
impl ImageGenerator for GatewayImageGenerator {
    fn name(&self) -> &str {
        "gateway"
    }

    async fn generate(&self, prompt: &str, reference: Option<&str>) -> Result<String> {
        info!(model = %self.model, edit = reference.is_some(), "Generating image");

        let body = ImageChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::user(prompt_content(prompt, reference))],
            modalities: ["image", "text"],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| OmnixError::transport(format!("image gateway request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Image gateway returned an error");
            return Err(OmnixError::upstream(status.as_u16(), error_body));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| OmnixError::upstream(status.as_u16(), format!("invalid JSON body: {e}")))?;

        data.pointer("/choices/0/message/images/0/image_url/url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                warn!(
                    has_choices = data.get("choices").is_some(),
                    has_message = data.pointer("/choices/0/message").is_some(),
                    "Image gateway response carried no image"
                );
                OmnixError::upstream(status.as_u16(), "No image URL in response")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn reference_image_becomes_multipart_content() {
        let content = prompt_content("make it blue", Some("https://x/cat.png"));
        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            json!([
                {"type": "text", "text": "make it blue"},
                {"type": "image_url", "image_url": {"url": "https://x/cat.png"}}
            ])
        );
        assert_eq!(prompt_content("a cat", None), MessageContent::Text("a cat".into()));
    }

    #[tokio::test]
    async fn extracts_first_image_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"modalities": ["image", "text"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {
                    "content": "here you go",
                    "images": [{"type": "image_url", "image_url": {"url": "data:image/png;base64,iVBO"}}]
                }}]
            })))
            .mount(&server)
            .await;

        let generator = GatewayImageGenerator::new("key").with_base_url(server.uri());
        let url = generator.generate("a cat", None).await.unwrap();
        assert_eq!(url, "data:image/png;base64,iVBO");
    }

    #[tokio::test]
    async fn missing_image_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "I cannot draw that"}}]
            })))
            .mount(&server)
            .await;

        let generator = GatewayImageGenerator::new("key").with_base_url(server.uri());
        let err = generator.generate("a cat", None).await.unwrap_err();
        assert!(err.to_string().contains("No image URL in response"));
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Reference to an image, either a remote URI or a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One element of a multi-part user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::ImageUrl { .. })
    }
}

/// Message content: plain text, or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenated text of the content, ignoring image parts.
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

/// A role-tagged message as exchanged with chat-completion providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Attachment payload as sent by clients: a single part or a list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileContent {
    Many(Vec<ContentPart>),
    One(ContentPart),
}

impl FileContent {
    pub fn is_empty(&self) -> bool {
        match self {
            FileContent::Many(parts) => parts.is_empty(),
            FileContent::One(_) => false,
        }
    }

    pub fn into_parts(self) -> Vec<ContentPart> {
        match self {
            FileContent::Many(parts) => parts,
            FileContent::One(part) => vec![part],
        }
    }
}

impl From<Vec<ContentPart>> for FileContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        FileContent::Many(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_parts_use_provider_wire_shape() {
        let parts = vec![
            ContentPart::text("describe this"),
            ContentPart::image_url("https://example.com/cat.png"),
        ];
        let value = serde_json::to_value(&parts).unwrap();
        assert_eq!(
            value,
            json!([
                {"type": "text", "text": "describe this"},
                {"type": "image_url", "image_url": {"url": "https://example.com/cat.png"}}
            ])
        );
    }

    #[test]
    fn file_content_accepts_object_or_array() {
        let one: FileContent =
            serde_json::from_value(json!({"type": "text", "text": "notes"})).unwrap();
        assert_eq!(one.into_parts(), vec![ContentPart::text("notes")]);

        let many: FileContent = serde_json::from_value(json!([
            {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
        ]))
        .unwrap();
        let parts = many.into_parts();
        assert_eq!(parts.len(), 1);
        assert!(parts[0].is_image());
    }

    #[test]
    fn plain_text_message_serializes_as_string() {
        let msg = ChatMessage::user("hello");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "user", "content": "hello"})
        );
    }

    #[test]
    fn as_text_skips_images() {
        let content = MessageContent::Parts(vec![
            ContentPart::text("a"),
            ContentPart::image_url("https://x/y.png"),
            ContentPart::text("b"),
        ]);
        assert_eq!(content.as_text(), "a\nb");
    }
}

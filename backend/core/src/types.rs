use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OmnixError, Result};
use crate::message::{ChatMessage, FileContent};

/// Body of a chat relay call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<Vec<ChatMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_content: Option<FileContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// `null` reads as `false`.
    #[serde(default, deserialize_with = "null_as_false")]
    pub stream: bool,
}

fn null_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl RelayRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Message text, if present and non-empty. Whitespace counts as text.
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_deref().filter(|text| !text.is_empty())
    }

    pub fn has_attachments(&self) -> bool {
        self.file_content.as_ref().is_some_and(|fc| !fc.is_empty())
    }

    /// A request needs either message text or at least one attachment.
    pub fn validate(&self) -> Result<()> {
        if self.message_text().is_none() && !self.has_attachments() {
            return Err(OmnixError::validation("Message or file content is required"));
        }
        Ok(())
    }
}

/// Normalized answer of a non-streaming chat relay call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub response: String,
    pub model: String,
    #[serde(default)]
    pub usage: Value,
}

/// Error body returned by every proxy endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// Speech synthesis call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
}

/// Base64-encoded synthesized audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechResponse {
    pub audio_content: String,
}

/// Speech-to-text call carrying base64 audio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionRequest {
    #[serde(default)]
    pub audio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// Image generation call, optionally with a reference image to edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
    pub prompt: String,
}

//! Chat relay (`POST /v1/ai-chat`).
//!
//! Prepends the mode preamble, forwards the conversation upstream, and either
//! re-wraps the complete answer or pipes the provider's SSE bytes through
//! untouched.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use logging::RelayEventLogger;
use omnix_core::{
    ChatMessage, ContentPart, MessageContent, ModePreambles, OmnixError, RelayRequest,
    RelayResponse, UpstreamRequest,
};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Upstream message list: system preamble, prior turns verbatim, then the new
/// user message. Attachments turn the user content into a part list.
pub fn build_upstream_messages(modes: &ModePreambles, request: &RelayRequest) -> Vec<ChatMessage> {
    let history = request.conversation_history.as_deref().unwrap_or_default();
    let mut messages = Vec::with_capacity(history.len() + 2);

    messages.push(ChatMessage::system(modes.preamble(request.mode.as_deref())));
    messages.extend(history.iter().cloned());

    let text = request.message_text().unwrap_or_default();
    let content = match request.file_content.clone().filter(|fc| !fc.is_empty()) {
        Some(files) => {
            let mut parts = Vec::new();
            if !text.is_empty() {
                parts.push(ContentPart::text(text));
            }
            parts.extend(files.into_parts());
            MessageContent::Parts(parts)
        }
        None => MessageContent::Text(text.to_string()),
    };
    messages.push(ChatMessage::user(content));

    messages
}

/// Handler for `POST /v1/ai-chat`.
#[instrument(name = "ai_chat", skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn ai_chat(State(state): State<GatewayState>, body: Bytes) -> Result<Response, ApiError> {
    let request: RelayRequest = serde_json::from_slice(&body)?;
    request.validate()?;

    let history_len = request.conversation_history.as_ref().map_or(0, Vec::len);
    RelayEventLogger::received(
        "/v1/ai-chat",
        request.mode.as_deref(),
        request.stream,
        history_len,
        request.message_text().unwrap_or_default(),
    );

    let upstream = state
        .chat
        .clone()
        .ok_or_else(|| OmnixError::configuration("OPENAI_API_KEY is not configured"))?;

    let upstream_request = UpstreamRequest {
        messages: build_upstream_messages(&state.modes, &request),
        stream: request.stream,
    };
    debug!(
        messages = upstream_request.messages.len(),
        attachments = request.has_attachments(),
        "Forwarding conversation upstream"
    );
    RelayEventLogger::upstream_opened(upstream.name(), upstream.model(), request.stream);

    if !request.stream {
        let completion = upstream.complete(&upstream_request).await?;
        RelayEventLogger::completed(upstream.name(), completion.content.chars().count());
        return Ok(Json(RelayResponse {
            response: completion.content,
            model: completion.model,
            usage: completion.usage,
        })
        .into_response());
    }

    let provider = upstream.name().to_string();
    let events = upstream.stream(&upstream_request).await?;
    info!(provider = %provider, "Piping upstream event stream");

    // Bytes are forwarded as they arrive; a mid-stream failure ends the body.
    let events = events.inspect_err(move |err| {
        warn!(provider = %provider, error = %err, "Upstream stream failed mid-response");
    });

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(events),
    )
        .into_response())
}

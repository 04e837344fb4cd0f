//! Speech proxies: `POST /v1/text-to-speech` and `POST /v1/speech-to-text`.

use axum::{body::Bytes, extract::State, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::info;

use omnix_core::{
    OmnixError, SpeechRequest, SpeechResponse, TranscriptionRequest, TranscriptionResponse,
};
use omnix_media::MediaPayload;
use omnix_tts::TtsRequest;

use crate::error::ApiError;
use crate::server::GatewayState;

/// Decode base64 audio, accepting a bare payload or a `data:` URI.
fn decode_audio(encoded: &str) -> Result<Bytes, OmnixError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    STANDARD
        .decode(payload.trim())
        .map(Bytes::from)
        .map_err(|e| OmnixError::validation(format!("Audio is not valid base64: {e}")))
}

/// Handler for `POST /v1/text-to-speech`: `{text, voiceId?}` → `{audioContent}`.
pub async fn text_to_speech(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<SpeechResponse>, ApiError> {
    let request: SpeechRequest = serde_json::from_slice(&body)?;
    if request.text.trim().is_empty() {
        return Err(OmnixError::validation("Text is required").into());
    }

    let tts = state
        .tts
        .clone()
        .ok_or_else(|| OmnixError::configuration("ELEVENLABS_API_KEY is not configured"))?;

    info!(provider = tts.name(), chars = request.text.len(), "Synthesizing speech");
    let audio = tts
        .synthesize(TtsRequest::new(request.text).with_voice(request.voice_id))
        .await?;

    Ok(Json(SpeechResponse {
        audio_content: STANDARD.encode(&audio),
    }))
}

/// Handler for `POST /v1/speech-to-text`: `{audio, mimeType?}` → `{text}`.
pub async fn speech_to_text(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    let request: TranscriptionRequest = serde_json::from_slice(&body)?;
    if request.audio.trim().is_empty() {
        return Err(OmnixError::validation("No audio data provided").into());
    }
    let audio = decode_audio(&request.audio)?;

    let stt = state
        .stt
        .clone()
        .ok_or_else(|| OmnixError::configuration("ELEVENLABS_API_KEY is not configured"))?;

    let payload = MediaPayload::new(audio).with_mime_type(request.mime_type);
    let text = stt.transcribe(&payload).await?;
    info!(provider = stt.name(), chars = text.len(), "Transcription complete");

    Ok(Json(TranscriptionResponse { text }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use omnix_core::{ModePreambles, Result};
    use omnix_media::Transcriber;
    use omnix_tts::TtsProvider;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::server::router;

    struct FixedTts;

    #[async_trait]
    impl TtsProvider for FixedTts {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn synthesize(&self, req: TtsRequest) -> Result<Bytes> {
            if req.voice.as_deref() == Some("broken") {
                return Err(OmnixError::upstream(422, "unknown voice"));
            }
            Ok(Bytes::from_static(b"ID3audio"))
        }
    }

    #[derive(Default)]
    struct RecordingStt {
        seen: Mutex<Option<MediaPayload>>,
    }

    #[async_trait]
    impl Transcriber for RecordingStt {
        fn name(&self) -> &str {
            "recording"
        }

        async fn transcribe(&self, payload: &MediaPayload) -> Result<String> {
            *self.seen.lock().unwrap() = Some(payload.clone());
            Ok("hello there".to_string())
        }
    }

    async fn post(state: GatewayState, uri: &str, body: Value) -> Response {
        router(state)
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn synthesis_returns_base64_audio() {
        let state = GatewayState::new(ModePreambles::new()).with_tts(Arc::new(FixedTts));
        let response = post(state, "/v1/text-to-speech", json!({"text": "hi"})).await;

        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        let audio = STANDARD.decode(value["audioContent"].as_str().unwrap()).unwrap();
        assert_eq!(audio, b"ID3audio");
    }

    #[tokio::test]
    async fn synthesis_provider_error_is_500() {
        let state = GatewayState::new(ModePreambles::new()).with_tts(Arc::new(FixedTts));
        let response = post(state, "/v1/text-to-speech", json!({"text": "hi", "voiceId": "broken"})).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(response).await["error"].as_str().unwrap().contains("422"));
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let state = GatewayState::new(ModePreambles::new()).with_tts(Arc::new(FixedTts));
        let response = post(state, "/v1/text-to-speech", json!({"text": "  "})).await;
        assert_eq!(body_json(response).await["error"], "Text is required");
    }

    #[tokio::test]
    async fn transcription_decodes_audio_and_keeps_mime_type() {
        let stt = Arc::new(RecordingStt::default());
        let state = GatewayState::new(ModePreambles::new()).with_stt(stt.clone());
        let audio = STANDARD.encode(b"OggS-clip");
        let response = post(
            state,
            "/v1/speech-to-text",
            json!({"audio": audio, "mimeType": "audio/ogg"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["text"], "hello there");
        let seen = stt.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.data.as_ref(), b"OggS-clip");
        assert_eq!(seen.mime_type.as_deref(), Some("audio/ogg"));
    }

    #[test]
    fn data_uri_audio_is_accepted() {
        let encoded = format!("data:audio/webm;base64,{}", STANDARD.encode(b"abc"));
        assert_eq!(decode_audio(&encoded).unwrap().as_ref(), b"abc");
        assert!(decode_audio("!!!").is_err());
    }
}

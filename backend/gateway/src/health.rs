use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub chat: bool,
    pub speech: bool,
    pub transcription: bool,
    pub images: bool,
}

/// Handler for `GET /api/health`.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        service: "omnix-relay",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        chat: state.chat.is_some(),
        speech: state.tts.is_some(),
        transcription: state.stt.is_some(),
        images: state.images.is_some(),
    })
}

//! Main HTTP relay server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::{
    http::{header, HeaderName, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use omnix_core::{ChatUpstream, ModePreambles};
use omnix_media::{ImageGenerator, Transcriber};
use omnix_tts::TtsProvider;

use crate::{health, image, relay, voice};

/// Providers shared across routes. Each one is optional: a request to an
/// endpoint whose provider is missing fails with a configuration error.
#[derive(Clone)]
pub struct GatewayState {
    pub chat: Option<Arc<dyn ChatUpstream>>,
    pub tts: Option<Arc<dyn TtsProvider>>,
    pub stt: Option<Arc<dyn Transcriber>>,
    pub images: Option<Arc<dyn ImageGenerator>>,
    pub modes: Arc<ModePreambles>,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(modes: ModePreambles) -> Self {
        Self {
            chat: None,
            tts: None,
            stt: None,
            images: None,
            modes: Arc::new(modes),
            started_at: Instant::now(),
        }
    }

    pub fn with_chat(mut self, upstream: Arc<dyn ChatUpstream>) -> Self {
        self.chat = Some(upstream);
        self
    }

    pub fn with_tts(mut self, tts: Arc<dyn TtsProvider>) -> Self {
        self.tts = Some(tts);
        self
    }

    pub fn with_stt(mut self, stt: Arc<dyn Transcriber>) -> Self {
        self.stt = Some(stt);
        self
    }

    pub fn with_images(mut self, images: Arc<dyn ImageGenerator>) -> Self {
        self.images = Some(images);
        self
    }
}

/// Empty 200 for `OPTIONS` requests that are not CORS preflights.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

/// Relay routes with CORS and request tracing applied.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/v1/ai-chat", post(relay::ai_chat).options(preflight))
        .route("/v1/text-to-speech", post(voice::text_to_speech).options(preflight))
        .route("/v1/speech-to-text", post(voice::speech_to_text).options(preflight))
        .route("/v1/generate-image", post(image::generate_image).options(preflight))
        .route("/api/health", get(health::get_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Starts the relay and serves until the process is stopped.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    info!(
        chat = state.chat.is_some(),
        speech = state.tts.is_some(),
        transcription = state.stt.is_some(),
        images = state.images.is_some(),
        "Relay providers configured"
    );
    let app = router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("OMNIX relay listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

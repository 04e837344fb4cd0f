use axum::{body::Bytes, extract::State, Json};
use tracing::info;

use omnix_core::{ImageRequest, ImageResponse, OmnixError};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Handler for `POST /v1/generate-image`: `{prompt, imageUrl?}` → `{imageUrl, prompt}`.
pub async fn generate_image(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<ImageResponse>, ApiError> {
    let request: ImageRequest = serde_json::from_slice(&body)?;
    if request.prompt.trim().is_empty() {
        return Err(OmnixError::validation("Prompt is required").into());
    }

    let generator = state
        .images
        .clone()
        .ok_or_else(|| OmnixError::configuration("LOVABLE_API_KEY is not configured"))?;

    let image_url = generator
        .generate(&request.prompt, request.image_url.as_deref())
        .await?;
    info!(provider = generator.name(), "Image generated");

    Ok(Json(ImageResponse {
        image_url,
        prompt: request.prompt,
    }))
}

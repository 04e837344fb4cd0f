use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use logging::RelayEventLogger;
use omnix_core::{ErrorEnvelope, OmnixError};

/// Handler error. Every variant is reported to the caller as HTTP 500 with an
/// `{"error": message}` body, which is the contract clients depend on.
#[derive(Debug)]
pub struct ApiError(pub OmnixError);

impl From<OmnixError> for ApiError {
    fn from(err: OmnixError) -> Self {
        Self(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self(OmnixError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        error!(kind = self.0.kind(), status = ?self.0.upstream_status(), "Relay request failed");
        RelayEventLogger::failed(self.0.kind(), &message);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorEnvelope { error: message }),
        )
            .into_response()
    }
}

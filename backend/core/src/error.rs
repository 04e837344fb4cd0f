use thiserror::Error;

/// Result alias used across the OMNIX crates.
pub type Result<T> = std::result::Result<T, OmnixError>;

/// Top-level error type for the relay and its clients.
#[derive(Debug, Error)]
pub enum OmnixError {
    /// Required input is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// A provider credential or endpoint is not configured.
    #[error("{0}")]
    Configuration(String),

    /// The provider answered with a non-success status or an unusable body.
    #[error("upstream error: {status} - {body}")]
    Upstream { status: u16, body: String },

    /// Network or stream-read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// A single payload could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A send was attempted while another stream is still open.
    #[error("a response is already streaming for this conversation")]
    StreamInProgress,

    /// The caller cancelled the stream.
    #[error("stream cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OmnixError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Upstream status code, when the error came from a provider response.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short machine-readable name of the variant, used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Configuration(_) => "configuration",
            Self::Upstream { .. } => "upstream",
            Self::Transport(_) => "transport",
            Self::Parse(_) => "parse",
            Self::StreamInProgress => "stream_in_progress",
            Self::Cancelled => "cancelled",
            Self::Other(_) => "other",
        }
    }
}

impl From<serde_json::Error> for OmnixError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

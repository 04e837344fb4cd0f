//! Relay Event Logger
//!
//! Lifecycle events of relay calls, emitted as structured tracing events under
//! the `relay_events` target so they can be filtered into their own stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::truncate_for_log;

const PREVIEW_CHARS: usize = 120;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    Received {
        endpoint: String,
        mode: Option<String>,
        stream: bool,
        history_len: usize,
        preview: String,
    },
    UpstreamOpened {
        provider: String,
        model: String,
        stream: bool,
    },
    Completed {
        provider: String,
        chars: usize,
    },
    Failed {
        kind: String,
        error: String,
    },
}

impl RelayEvent {
    fn is_failure(&self) -> bool {
        matches!(self, RelayEvent::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RelayEventEntry {
    pub timestamp: DateTime<Utc>,
    pub event: RelayEvent,
}

pub struct RelayEventLogger;

impl RelayEventLogger {
    pub fn received(endpoint: &str, mode: Option<&str>, stream: bool, history_len: usize, message: &str) {
        Self::log_event(RelayEvent::Received {
            endpoint: endpoint.to_string(),
            mode: mode.map(str::to_string),
            stream,
            history_len,
            preview: message.to_string(),
        });
    }

    pub fn upstream_opened(provider: &str, model: &str, stream: bool) {
        Self::log_event(RelayEvent::UpstreamOpened {
            provider: provider.to_string(),
            model: model.to_string(),
            stream,
        });
    }

    pub fn completed(provider: &str, chars: usize) {
        Self::log_event(RelayEvent::Completed {
            provider: provider.to_string(),
            chars,
        });
    }

    pub fn failed(kind: &str, error: &str) {
        Self::log_event(RelayEvent::Failed {
            kind: kind.to_string(),
            error: error.to_string(),
        });
    }

    /// Redacts free-text fields and emits the event.
    pub fn log_event(mut event: RelayEvent) {
        match &mut event {
            RelayEvent::Received { preview, .. } => {
                *preview = truncate_for_log(preview, PREVIEW_CHARS);
            }
            RelayEvent::Failed { error, .. } => {
                *error = truncate_for_log(error, PREVIEW_CHARS * 4);
            }
            RelayEvent::UpstreamOpened { .. } | RelayEvent::Completed { .. } => {}
        }

        let failure = event.is_failure();
        let entry = RelayEventEntry {
            timestamp: Utc::now(),
            event,
        };
        let payload = serde_json::to_string(&entry).unwrap_or_default();

        if failure {
            warn!(target: "relay_events", event = %payload, "Relay event");
        } else {
            info!(target: "relay_events", event = %payload, "Relay event");
        }
    }
}

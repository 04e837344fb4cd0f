//! Structured logging for the OMNIX relay.
//!
//! Handles subscriber setup, log redaction, and relay lifecycle events.

pub mod logger;
pub mod redact;
pub mod relay_events;

pub use logger::init_logger;
pub use redact::{redact_sensitive_data, truncate_for_log};
pub use relay_events::{RelayEvent, RelayEventEntry, RelayEventLogger};

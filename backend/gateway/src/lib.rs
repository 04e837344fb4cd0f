//! OMNIX relay HTTP server.
//!
//! Stateless proxies in front of the chat-completion, speech and image
//! providers. Every failure is answered with HTTP 500 and `{"error": ...}`.

pub mod error;
pub mod health;
pub mod image;
pub mod relay;
pub mod server;
pub mod voice;

pub use error::ApiError;
pub use relay::build_upstream_messages;
pub use server::{router, start_server, GatewayState};

//! Client side of the OMNIX relay.
//!
//! `StreamingConsumer` turns the relay's SSE body into content fragments,
//! `Conversation` keeps the turn log, and `ChatSession` ties the two together.

pub mod attachments;
pub mod consumer;
pub mod conversation;
pub mod relay;
pub mod session;
pub mod sse;

#[cfg(test)]
mod test_support;

pub use attachments::{
    data_uri, image_bytes_attachment, image_url_attachment, load_attachment, parse_data_uri,
    text_attachment,
};
pub use consumer::{CallbackTriple, FragmentStream, StreamCallbacks, StreamingConsumer};
pub use conversation::{Conversation, ConversationTurn, APOLOGY_PLACEHOLDER};
pub use relay::{CredentialSource, RelayClient, StaticToken};
pub use session::ChatSession;
pub use sse::{FragmentParser, SseDecoder};

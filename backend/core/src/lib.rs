pub mod adapter;
pub mod error;
pub mod message;
pub mod mode;
pub mod traits;
pub mod types;

pub use adapter::{adapter_for, AnthropicAdapter, OpenAiAdapter, ResponseAdapter};
pub use error::{OmnixError, Result};
pub use message::{ChatMessage, ContentPart, FileContent, ImageUrl, MessageContent, Role};
pub use mode::{builtin_modes, welcome_message, ModePreambles};
pub use traits::{ByteStream, ChatUpstream, UpstreamCompletion, UpstreamRequest};
pub use types::{
    ErrorEnvelope, ImageRequest, ImageResponse, RelayRequest, RelayResponse, SpeechRequest,
    SpeechResponse, TranscriptionRequest, TranscriptionResponse,
};

//! Speech synthesis for the OMNIX voice proxy.

pub mod engine;

pub use engine::{create_tts, ElevenLabsTts, OpenAiTts, TtsProvider, TtsProviderKind, TtsRequest};

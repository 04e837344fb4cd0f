//! Incremental SSE decoding.
//!
//! Network chunks can end inside a multi-byte UTF-8 sequence or in the middle
//! of a line. Both are carried over to the next chunk, so fragments come out
//! exactly as the provider sent them regardless of how the body was split.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use omnix_core::ResponseAdapter;

/// End-of-stream marker sent as the last `data:` payload.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Splits a byte stream into `data:` payloads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    /// Text after the last newline.
    line: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the payloads of every line it completed.
    /// The `[DONE]` sentinel is never returned.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.decode(chunk);
        self.line.push_str(&text);

        let mut payloads = Vec::new();
        while let Some(end) = self.line.find('\n') {
            let line: String = self.line.drain(..=end).collect();
            payloads.extend(data_payload(&line));
        }
        payloads
    }

    /// Flush at end of body: a final line without a newline still counts.
    pub fn finish(&mut self) -> Vec<String> {
        if !self.pending.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.line.push_str(&tail);
        }
        let line = std::mem::take(&mut self.line);
        data_payload(&line).into_iter().collect()
    }

    /// Decode as much of `pending + chunk` as forms complete characters.
    /// Invalid sequences become U+FFFD; an incomplete tail is kept.
    fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut consumed = 0;
        while consumed < self.pending.len() {
            match std::str::from_utf8(&self.pending[consumed..]) {
                Ok(text) => {
                    out.push_str(text);
                    consumed = self.pending.len();
                }
                Err(err) => {
                    let valid = consumed + err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[consumed..valid]));
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            consumed = valid + bad;
                        }
                        None => {
                            consumed = valid;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
        out
    }
}

/// Payload of a `data:` line, without the sentinel and blank payloads.
fn data_payload(line: &str) -> Option<String> {
    let line = line.trim_end_matches(['\n', '\r']);
    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    if payload.is_empty() || payload == DONE_SENTINEL {
        return None;
    }
    Some(payload.to_string())
}

/// Turns raw chunks into content fragments using a provider adapter.
pub struct FragmentParser {
    decoder: SseDecoder,
    adapter: Arc<dyn ResponseAdapter>,
}

impl FragmentParser {
    pub fn new(adapter: Arc<dyn ResponseAdapter>) -> Self {
        Self {
            decoder: SseDecoder::new(),
            adapter,
        }
    }

    /// Non-empty fragments completed by `chunk`, in arrival order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let payloads = self.decoder.feed(chunk);
        self.extract(payloads)
    }

    pub fn finish(&mut self) -> Vec<String> {
        let payloads = self.decoder.finish();
        self.extract(payloads)
    }

    fn extract(&self, payloads: Vec<String>) -> Vec<String> {
        payloads
            .into_iter()
            .filter_map(|payload| match serde_json::from_str::<Value>(&payload) {
                Ok(event) => self
                    .adapter
                    .stream_delta(&event)
                    .filter(|fragment| !fragment.is_empty())
                    .map(str::to_string),
                Err(err) => {
                    debug!(provider = self.adapter.provider(), error = %err, "Skipping malformed SSE payload");
                    None
                }
            })
            .collect()
    }
}

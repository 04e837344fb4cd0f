use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde_json::{json, Value};

use omnix_core::{
    ByteStream, ChatUpstream, OmnixError, Result, UpstreamCompletion, UpstreamRequest,
};

/// A mock upstream that answers with canned text.
///
/// Streaming emits one OpenAI-style SSE event per fragment, then `[DONE]`.
pub struct MockUpstream {
    name: String,
    fragments: Vec<String>,
    failure: Option<(u16, String)>,
}

impl MockUpstream {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fragments: vec!["Mock response".to_string()],
            failure: None,
        }
    }

    /// Answer with `fragments`, streamed one event each.
    pub fn with_fragments<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments = fragments.into_iter().map(Into::into).collect();
        self
    }

    /// Fail every call with the given upstream status and body.
    pub fn failing(mut self, status: u16, body: impl Into<String>) -> Self {
        self.failure = Some((status, body.into()));
        self
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some((status, body)) => Err(OmnixError::upstream(*status, body.clone())),
            None => Ok(()),
        }
    }

    /// The SSE body `stream` produces.
    pub fn sse_body(&self) -> String {
        let mut body = String::new();
        for fragment in &self.fragments {
            let event: Value = json!({"choices": [{"index": 0, "delta": {"content": fragment}}]});
            body.push_str(&format!("data: {event}\n\n"));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }
}

#[async_trait]
impl ChatUpstream for MockUpstream {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _request: &UpstreamRequest) -> Result<UpstreamCompletion> {
        self.check()?;
        Ok(UpstreamCompletion {
            content: self.fragments.concat(),
            model: "mock".to_string(),
            usage: json!({"total_tokens": self.fragments.len()}),
        })
    }

    async fn stream(&self, _request: &UpstreamRequest) -> Result<ByteStream> {
        self.check()?;
        let chunks: Vec<Result<Bytes>> = self
            .sse_body()
            .split_inclusive("\n\n")
            .map(|event| Ok(Bytes::from(event.to_string())))
            .collect();
        Ok(futures::stream::iter(chunks).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use omnix_core::ChatMessage;

    fn request() -> UpstreamRequest {
        UpstreamRequest {
            messages: vec![ChatMessage::user("hi")],
            stream: false,
        }
    }

    #[tokio::test]
    async fn complete_concatenates_fragments() {
        let upstream = MockUpstream::new("mock").with_fragments(["Hel", "lo"]);
        let completion = upstream.complete(&request()).await.unwrap();
        assert_eq!(completion.content, "Hello");
    }

    #[tokio::test]
    async fn stream_emits_one_event_per_fragment() {
        let upstream = MockUpstream::new("mock").with_fragments(["a", "b"]);
        let chunks: Vec<Bytes> = upstream.stream(&request()).await.unwrap().try_collect().await.unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks[2].starts_with(b"data: [DONE]"));
    }

    #[tokio::test]
    async fn failing_mock_reports_status() {
        let upstream = MockUpstream::new("mock").failing(500, "boom");
        let err = upstream.complete(&request()).await.unwrap_err();
        assert_eq!(err.upstream_status(), Some(500));
    }
}

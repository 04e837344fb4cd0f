//! Streaming Consumer.
//!
//! Sends a relay request with `stream: true` and yields content fragments as
//! they arrive. The preferred interface is `stream_fragments`, a cancellable
//! async stream; `send_streaming_message` wraps it in the token / complete /
//! error callback triple.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use omnix_core::{
    adapter_for, ChatMessage, FileContent, OmnixError, RelayRequest, RelayResponse,
    ResponseAdapter, Result,
};

use crate::relay::{RelayClient, CHAT_PATH};
use crate::sse::FragmentParser;

/// Content fragments in arrival order. Ends after the last fragment, or with
/// a single error (including `OmnixError::Cancelled`).
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Receives the outcome of one streamed reply. Exactly one of `on_complete`
/// and `on_error` is called, after all `on_token` calls.
pub trait StreamCallbacks {
    fn on_token(&mut self, fragment: &str);
    fn on_complete(&mut self, full_response: String);
    fn on_error(&mut self, error: OmnixError);
}

/// `StreamCallbacks` built from three closures.
pub struct CallbackTriple<T, C, E> {
    pub on_token: T,
    pub on_complete: C,
    pub on_error: E,
}

impl<T, C, E> StreamCallbacks for CallbackTriple<T, C, E>
where
    T: FnMut(&str),
    C: FnMut(String),
    E: FnMut(OmnixError),
{
    fn on_token(&mut self, fragment: &str) {
        (self.on_token)(fragment)
    }

    fn on_complete(&mut self, full_response: String) {
        (self.on_complete)(full_response)
    }

    fn on_error(&mut self, error: OmnixError) {
        (self.on_error)(error)
    }
}

/// Clears the in-flight flag when dropped.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| OmnixError::StreamInProgress)?;
        Ok(Self(flag.clone()))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One conversation's connection to the relay. At most one request is in
/// flight at a time; a second send fails with `StreamInProgress`.
pub struct StreamingConsumer {
    relay: RelayClient,
    adapter: Arc<dyn ResponseAdapter>,
    chunk_timeout: Option<Duration>,
    in_flight: Arc<AtomicBool>,
}

struct StreamState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    parser: FragmentParser,
    queued: VecDeque<String>,
    cancel: CancellationToken,
    chunk_timeout: Option<Duration>,
    finished: bool,
    _guard: Option<InFlightGuard>,
}

impl StreamingConsumer {
    pub fn new(relay: RelayClient) -> Self {
        Self {
            relay,
            adapter: adapter_for("openai"),
            chunk_timeout: None,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Adapter for the delta shape of the provider behind the relay.
    pub fn with_adapter(mut self, adapter: Arc<dyn ResponseAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    /// Fail the stream when no chunk arrives within `timeout`.
    pub fn with_chunk_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.chunk_timeout = timeout;
        self
    }

    pub fn relay(&self) -> &RelayClient {
        &self.relay
    }

    pub fn adapter(&self) -> &dyn ResponseAdapter {
        self.adapter.as_ref()
    }

    /// True from the start of a send until its outcome is delivered.
    pub fn is_streaming(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start a streamed reply. The in-flight flag stays set until the
    /// returned stream is dropped.
    pub async fn stream_fragments(
        &self,
        request: RelayRequest,
        cancel: CancellationToken,
    ) -> Result<FragmentStream> {
        let guard = InFlightGuard::acquire(&self.in_flight)?;
        self.open(request, cancel, Some(guard)).await
    }

    async fn open(
        &self,
        mut request: RelayRequest,
        cancel: CancellationToken,
        guard: Option<InFlightGuard>,
    ) -> Result<FragmentStream> {
        request.stream = true;
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(OmnixError::Cancelled),
            response = self.relay.post(CHAT_PATH, &request) => response?,
        };
        info!(status = response.status().as_u16(), "Relay stream opened");

        let state = StreamState {
            body: response.bytes_stream().boxed(),
            parser: FragmentParser::new(self.adapter.clone()),
            queued: VecDeque::new(),
            cancel,
            chunk_timeout: self.chunk_timeout,
            finished: false,
            _guard: guard,
        };

        Ok(stream::unfold(state, |mut state| async move {
            loop {
                if let Some(fragment) = state.queued.pop_front() {
                    return Some((Ok(fragment), state));
                }
                if state.finished {
                    return None;
                }

                let next = tokio::select! {
                    biased;
                    _ = state.cancel.cancelled() => Err(OmnixError::Cancelled),
                    next = next_chunk(&mut state.body, state.chunk_timeout) => next,
                };

                match next {
                    Ok(Some(chunk)) => {
                        let fragments = state.parser.push(&chunk);
                        state.queued.extend(fragments);
                    }
                    Ok(None) => {
                        debug!("Relay stream ended");
                        state.finished = true;
                        let fragments = state.parser.finish();
                        state.queued.extend(fragments);
                    }
                    Err(err) => {
                        state.finished = true;
                        return Some((Err(err), state));
                    }
                }
            }
        })
        .boxed())
    }

    /// Callback form of a streamed send. `history` must not contain the
    /// reply being requested.
    pub async fn send_streaming_message(
        &self,
        message: &str,
        history: Vec<ChatMessage>,
        mode: Option<&str>,
        attachments: Option<FileContent>,
        callbacks: &mut dyn StreamCallbacks,
        cancel: CancellationToken,
    ) {
        let _guard = match InFlightGuard::acquire(&self.in_flight) {
            Ok(guard) => guard,
            Err(err) => return callbacks.on_error(err),
        };

        let request = RelayRequest {
            message: Some(message.to_string()),
            conversation_history: Some(history),
            file_content: attachments,
            mode: mode.map(str::to_string),
            stream: true,
        };

        let mut fragments = match self.open(request, cancel, None).await {
            Ok(fragments) => fragments,
            Err(err) => return callbacks.on_error(err),
        };

        let mut accumulated = String::new();
        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    accumulated.push_str(&fragment);
                    callbacks.on_token(&fragment);
                }
                Err(err) => {
                    warn!(error = %err, received = accumulated.len(), "Streaming failed");
                    return callbacks.on_error(err);
                }
            }
        }
        callbacks.on_complete(accumulated);
    }

    /// Non-streaming fallback: one request, one complete reply.
    pub async fn send_message(&self, mut request: RelayRequest) -> Result<RelayResponse> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        request.stream = false;
        self.relay.post_json(CHAT_PATH, &request).await
    }
}

async fn next_chunk(
    body: &mut BoxStream<'static, reqwest::Result<Bytes>>,
    chunk_timeout: Option<Duration>,
) -> Result<Option<Bytes>> {
    let next = match chunk_timeout {
        Some(limit) => tokio::time::timeout(limit, body.next()).await.map_err(|_| {
            OmnixError::transport(format!("no data from relay for {}s", limit.as_secs()))
        })?,
        None => body.next().await,
    };
    next.transpose()
        .map_err(|e| OmnixError::transport(format!("stream read failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use serde_json::json;
    use std::cell::RefCell;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse(fragments: &[&str]) -> String {
        let mut body = String::new();
        for fragment in fragments {
            body.push_str(&format!(
                "data: {}\n\n",
                json!({"choices": [{"delta": {"content": fragment}}]})
            ));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    async fn relay_with_body(body: String) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;
        server
    }

    #[derive(Default)]
    struct Recorded {
        tokens: Vec<String>,
        completed: Vec<String>,
        errors: Vec<String>,
    }

    async fn run(consumer: &StreamingConsumer) -> Recorded {
        let recorded = RefCell::new(Recorded::default());
        let mut callbacks = CallbackTriple {
            on_token: |t: &str| recorded.borrow_mut().tokens.push(t.to_string()),
            on_complete: |full: String| recorded.borrow_mut().completed.push(full),
            on_error: |e: OmnixError| recorded.borrow_mut().errors.push(e.to_string()),
        };
        consumer
            .send_streaming_message("hi", vec![], None, None, &mut callbacks, CancellationToken::new())
            .await;
        drop(callbacks);
        recorded.into_inner()
    }

    #[tokio::test]
    async fn tokens_in_order_then_one_completion() {
        let server = relay_with_body(sse(&["The", " quick", " fox"])).await;
        let consumer = StreamingConsumer::new(RelayClient::new(server.uri()));

        let recorded = run(&consumer).await;
        assert_eq!(recorded.tokens, vec!["The", " quick", " fox"]);
        assert_eq!(recorded.completed, vec!["The quick fox"]);
        assert!(recorded.errors.is_empty());
        assert!(!consumer.is_streaming());
    }

    #[tokio::test]
    async fn malformed_line_does_not_abort_stream() {
        let body = format!(
            "data: {}\n\ndata: not-json\n\ndata: {}\n\ndata: [DONE]\n\n",
            json!({"choices": [{"delta": {"content": "A"}}]}),
            json!({"choices": [{"delta": {"content": "B"}}]}),
        );
        let server = relay_with_body(body).await;
        let consumer = StreamingConsumer::new(RelayClient::new(server.uri()));

        let recorded = run(&consumer).await;
        assert_eq!(recorded.tokens, vec!["A", "B"]);
        assert_eq!(recorded.completed, vec!["AB"]);
    }

    #[tokio::test]
    async fn relay_error_goes_to_on_error_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "upstream error: 401 - bad key"})))
            .mount(&server)
            .await;
        let consumer = StreamingConsumer::new(RelayClient::new(server.uri()));

        let recorded = run(&consumer).await;
        assert!(recorded.completed.is_empty());
        assert_eq!(recorded.errors.len(), 1);
        assert!(recorded.errors[0].contains("401"));
    }

    #[tokio::test]
    async fn failure_after_tokens_reports_error_without_completion() {
        let relay = crate::test_support::stalling_relay("x").await;
        let consumer = StreamingConsumer::new(RelayClient::new(relay))
            .with_chunk_timeout(Some(Duration::from_millis(200)));

        let recorded = run(&consumer).await;
        assert_eq!(recorded.tokens, vec!["x"]);
        assert!(recorded.completed.is_empty());
        assert_eq!(recorded.errors.len(), 1);
        assert!(!consumer.is_streaming());
    }

    #[tokio::test]
    async fn second_send_while_streaming_is_rejected() {
        let server = relay_with_body(sse(&["x"])).await;
        let consumer = StreamingConsumer::new(RelayClient::new(server.uri()));

        let open = consumer
            .stream_fragments(RelayRequest::new("hi"), CancellationToken::new())
            .await
            .unwrap();
        assert!(consumer.is_streaming());

        let err = consumer.send_message(RelayRequest::new("again")).await.unwrap_err();
        assert!(matches!(err, OmnixError::StreamInProgress));

        drop(open);
        assert!(!consumer.is_streaming());
    }

    #[tokio::test]
    async fn cancelled_stream_ends_with_cancelled() {
        let server = relay_with_body(sse(&["a", "b"])).await;
        let consumer = StreamingConsumer::new(RelayClient::new(server.uri()));
        let cancel = CancellationToken::new();

        let mut fragments = consumer
            .stream_fragments(RelayRequest::new("hi"), cancel.clone())
            .await
            .unwrap();
        cancel.cancel();

        let mut saw_cancel = false;
        while let Some(item) = fragments.next().await {
            if let Err(err) = item {
                saw_cancel = matches!(err, OmnixError::Cancelled);
            }
        }
        assert!(saw_cancel);
    }

    #[tokio::test]
    async fn idle_body_hits_chunk_timeout() {
        let mut body: BoxStream<'static, reqwest::Result<Bytes>> = stream::pending().boxed();
        let err = next_chunk(&mut body, Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[tokio::test]
    async fn chunk_timeout_does_not_affect_healthy_stream() {
        let server = relay_with_body(sse(&["on", " time"])).await;
        let consumer = StreamingConsumer::new(RelayClient::new(server.uri()))
            .with_chunk_timeout(Some(Duration::from_secs(5)));
        let fragments: Vec<String> = consumer
            .stream_fragments(RelayRequest::new("hi"), CancellationToken::new())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(fragments, vec!["on", " time"]);
    }

    #[tokio::test]
    async fn fallback_returns_full_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Hello",
                "model": "gpt-4o-mini",
                "usage": {"total_tokens": 3}
            })))
            .mount(&server)
            .await;
        let consumer = StreamingConsumer::new(RelayClient::new(server.uri()));

        let reply = consumer.send_message(RelayRequest::new("hi")).await.unwrap();
        assert_eq!(reply.response, "Hello");
        assert!(!consumer.is_streaming());
    }
}

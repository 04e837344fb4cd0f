use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use omnix_core::{FileContent, RelayRequest, Result};

use crate::consumer::StreamingConsumer;
use crate::conversation::Conversation;

/// A conversation bound to a relay connection.
///
/// Each `send` opens an assistant turn, fills it from the streamed fragments
/// (or the single fallback reply), and seals it on completion or failure.
pub struct ChatSession {
    consumer: StreamingConsumer,
    conversation: Conversation,
    streaming: bool,
}

impl ChatSession {
    pub fn new(consumer: StreamingConsumer) -> Self {
        Self {
            consumer,
            conversation: Conversation::new(),
            streaming: true,
        }
    }

    /// Use the non-streaming fallback instead of SSE.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn consumer(&self) -> &StreamingConsumer {
        &self.consumer
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn select_mode(&mut self, mode: Option<&str>) -> Result<()> {
        self.conversation.select_mode(mode)
    }

    /// Send one user message; `on_token` sees each fragment as it arrives.
    /// Returns the sealed reply text.
    pub async fn send<F>(
        &mut self,
        message: &str,
        attachments: Option<FileContent>,
        mut on_token: F,
        cancel: CancellationToken,
    ) -> Result<String>
    where
        F: FnMut(&str),
    {
        let history = self.conversation.begin_exchange(message)?;
        let request = RelayRequest {
            message: Some(message.to_string()).filter(|m| !m.is_empty()),
            conversation_history: Some(history),
            file_content: attachments,
            mode: self.conversation.mode().map(str::to_string),
            stream: self.streaming,
        };

        let outcome = if self.streaming {
            self.stream_reply(request, &mut on_token, cancel).await
        } else {
            self.fallback_reply(request, &mut on_token).await
        };

        match outcome {
            Ok(final_text) => Ok(self.conversation.complete(final_text).unwrap_or_default()),
            Err(err) => {
                warn!(kind = err.kind(), "Reply failed; sealing turn");
                self.conversation.fail(&err);
                Err(err)
            }
        }
    }

    /// Streams into the open turn; the turn already holds the full text at the end.
    async fn stream_reply(
        &mut self,
        request: RelayRequest,
        on_token: &mut dyn FnMut(&str),
        cancel: CancellationToken,
    ) -> Result<Option<String>> {
        let mut fragments = self.consumer.stream_fragments(request, cancel).await?;
        let mut count = 0usize;
        while let Some(item) = fragments.next().await {
            let fragment = item?;
            count += 1;
            self.conversation.append(&fragment);
            on_token(&fragment);
        }
        info!(fragments = count, "Streamed reply complete");
        Ok(None)
    }

    async fn fallback_reply(
        &mut self,
        request: RelayRequest,
        on_token: &mut dyn FnMut(&str),
    ) -> Result<Option<String>> {
        let reply = self.consumer.send_message(request).await?;
        info!(model = %reply.model, "Fallback reply received");
        on_token(&reply.response);
        Ok(Some(reply.response))
    }
}

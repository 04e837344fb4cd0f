//! Conversation State: the ordered turn log of one chat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use omnix_core::{welcome_message, ChatMessage, OmnixError, Result, Role};

/// Content of an assistant turn whose reply failed.
pub const APOLOGY_PLACEHOLDER: &str =
    "Sorry, I ran into a problem while answering. Please try again.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Set while an assistant reply is still arriving.
    #[serde(default)]
    pub in_progress: bool,
}

impl ConversationTurn {
    fn sealed(role: Role, content: impl Into<String>, mode: Option<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            mode,
            in_progress: false,
        }
    }
}

/// Invariants: at most one in-progress turn, always the last one; its
/// content only grows until sealed; `history` never includes it.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
    mode: Option<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    pub fn is_in_progress(&self) -> bool {
        self.turns.last().is_some_and(|turn| turn.in_progress)
    }

    /// Switch mode. Selecting a mode starts a fresh conversation seeded
    /// with a sealed welcome turn; clearing it just empties the log.
    pub fn select_mode(&mut self, mode: Option<&str>) -> Result<()> {
        if self.is_in_progress() {
            return Err(OmnixError::StreamInProgress);
        }
        self.mode = mode.map(str::to_string);
        self.turns.clear();
        if let Some(mode) = mode {
            self.turns.push(ConversationTurn::sealed(
                Role::Assistant,
                welcome_message(mode),
                Some(mode.to_string()),
            ));
        }
        Ok(())
    }

    /// Sealed turns as role-tagged messages.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .filter(|turn| !turn.in_progress)
            .map(|turn| ChatMessage::new(turn.role, turn.content.as_str()))
            .collect()
    }

    /// Record the user's message and open an empty assistant turn.
    /// Returns the history to send with the message (prior turns only).
    pub fn begin_exchange(&mut self, user_text: &str) -> Result<Vec<ChatMessage>> {
        if self.is_in_progress() {
            return Err(OmnixError::StreamInProgress);
        }
        let history = self.history();
        self.turns
            .push(ConversationTurn::sealed(Role::User, user_text, None));
        self.turns.push(ConversationTurn {
            in_progress: true,
            ..ConversationTurn::sealed(Role::Assistant, String::new(), self.mode.clone())
        });
        Ok(history)
    }

    /// Append a fragment to the in-progress turn. No-op when nothing is open.
    pub fn append(&mut self, fragment: &str) {
        if let Some(turn) = self.open_turn() {
            turn.content.push_str(fragment);
        }
    }

    /// Seal the in-progress turn with its final content and return it.
    pub fn complete(&mut self, final_text: Option<String>) -> Option<String> {
        let turn = self.open_turn()?;
        if let Some(text) = final_text {
            turn.content = text;
        }
        turn.in_progress = false;
        Some(turn.content.clone())
    }

    /// Seal the in-progress turn after a failure. A cancelled reply keeps
    /// what arrived; any other error is replaced by the apology.
    pub fn fail(&mut self, error: &OmnixError) {
        let Some(turn) = self.open_turn() else { return };
        if !matches!(error, OmnixError::Cancelled) {
            turn.content = APOLOGY_PLACEHOLDER.to_string();
        }
        turn.in_progress = false;
    }

    fn open_turn(&mut self) -> Option<&mut ConversationTurn> {
        self.turns.last_mut().filter(|turn| turn.in_progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_excludes_in_progress_turn() {
        let mut conversation = Conversation::new();
        let history = conversation.begin_exchange("hello").unwrap();
        assert!(history.is_empty());

        conversation.append("Hi");
        let history = conversation.history();
        assert_eq!(history, vec![ChatMessage::user("hello")]);
    }

    #[test]
    fn content_grows_then_seals() {
        let mut conversation = Conversation::new();
        conversation.begin_exchange("q").unwrap();
        conversation.append("A");
        conversation.append("B");
        assert!(conversation.is_in_progress());
        assert_eq!(conversation.complete(None).as_deref(), Some("AB"));
        assert!(!conversation.is_in_progress());

        // Appends after sealing are ignored.
        conversation.append("C");
        assert_eq!(conversation.turns()[1].content, "AB");
    }

    #[test]
    fn second_exchange_while_open_is_rejected() {
        let mut conversation = Conversation::new();
        conversation.begin_exchange("one").unwrap();
        assert!(matches!(
            conversation.begin_exchange("two"),
            Err(OmnixError::StreamInProgress)
        ));
        assert_eq!(conversation.turns().len(), 2);
    }

    #[test]
    fn errors_seal_with_apology_but_cancel_keeps_partial() {
        let mut conversation = Conversation::new();
        conversation.begin_exchange("one").unwrap();
        conversation.append("partial");
        conversation.fail(&OmnixError::transport("reset"));
        assert_eq!(conversation.turns()[1].content, APOLOGY_PLACEHOLDER);

        conversation.begin_exchange("two").unwrap();
        conversation.append("half an answ");
        conversation.fail(&OmnixError::Cancelled);
        assert_eq!(conversation.turns()[3].content, "half an answ");
        assert!(!conversation.is_in_progress());
    }

    #[test]
    fn selecting_mode_seeds_welcome_turn() {
        let mut conversation = Conversation::new();
        conversation.begin_exchange("old").unwrap();
        conversation.complete(Some("reply".into()));

        conversation.select_mode(Some("code")).unwrap();
        assert_eq!(conversation.turns().len(), 1);
        assert_eq!(conversation.mode(), Some("code"));

        let history = conversation.begin_exchange("fix this").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::Assistant);
        assert!(history[0].content.as_text().contains("Code mode activated"));
        assert_eq!(conversation.turns()[2].mode.as_deref(), Some("code"));
    }
}

//! Conversation state owned by the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the conversation.
    System,
    /// The person asking questions.
    User,
    /// The assistant's replies.
    Assistant,
}

impl Role {
    /// Wire name used by chat APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    /// Who said it.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// When it was recorded.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Creates a turn stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered chat history for a single user session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    turns: Vec<ConversationTurn>,
}

impl Session {
    /// Starts an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user message.
    pub fn record_user(&mut self, content: impl Into<String>) {
        self.turns.push(ConversationTurn::new(Role::User, content));
    }

    /// Appends an assistant reply.
    pub fn record_assistant(&mut self, content: impl Into<String>) {
        self.turns
            .push(ConversationTurn::new(Role::Assistant, content));
    }

    /// Appends a question and its reply.
    pub fn record_exchange(&mut self, question: impl Into<String>, reply: impl Into<String>) {
        self.record_user(question);
        self.record_assistant(reply);
    }

    /// Full history, oldest first.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> &[ConversationTurn] {
        recent(&self.turns, n)
    }

    /// Number of recorded turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when nothing has been said yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Forgets the conversation.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// Tail window of `history` holding at most `n` turns.
pub fn recent(history: &[ConversationTurn], n: usize) -> &[ConversationTurn] {
    &history[history.len().saturating_sub(n)..]
}

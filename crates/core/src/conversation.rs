//! Conversation types including turn states and messages

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Turn-taking state of a conversation
///
/// Exactly one value is active at any instant. `Listening` and `Speaking`
/// being separate variants is what keeps the microphone and the voice output
/// mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// Waiting for the user to start a turn
    #[default]
    Idle,
    /// Microphone open, collecting transcript
    Listening,
    /// Dialogue engine is producing a reply
    Processing,
    /// Reply is being spoken
    Speaking,
    /// Speech hardware unusable until reset
    Error,
}

impl ConversationState {
    /// Get allowed transitions from current state
    pub fn allowed_transitions(&self) -> &'static [ConversationState] {
        use ConversationState::*;
        match self {
            Idle => &[Listening, Error],
            Listening => &[Processing, Idle, Error],
            Processing => &[Speaking, Idle],
            Speaking => &[Idle],
            Error => &[Idle],
        }
    }

    /// Check if transition to target state is allowed
    pub fn can_transition_to(&self, target: ConversationState) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, Self::Listening)
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self, Self::Speaking)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Processing => "processing",
            Self::Speaking => "speaking",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Bot,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Bot => "bot",
        }
    }
}

/// A single entry in the conversation transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Bot,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Receiver of finalized transcripts and replies
///
/// Owned by the presentation layer; the turn controller only appends.
pub trait ConversationSink: Send + 'static {
    fn append_user_message(&mut self, text: &str);

    fn append_bot_message(&mut self, text: &str);
}

/// In-memory, append-only message history
///
/// Clones share the same history, so one handle can be given to the
/// controller while another is read by the caller.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all messages in order
    pub fn messages(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    /// Most recent bot reply, if any
    pub fn last_bot_message(&self) -> Option<Message> {
        self.messages
            .read()
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Bot)
            .cloned()
    }

    pub fn clear(&self) {
        self.messages.write().clear();
    }
}

impl ConversationSink for MessageLog {
    fn append_user_message(&mut self, text: &str) {
        self.messages.write().push(Message::user(text));
    }

    fn append_bot_message(&mut self, text: &str) {
        self.messages.write().push(Message::bot(text));
    }
}

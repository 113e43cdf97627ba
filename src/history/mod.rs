//! Conversation history owned by the turn loop.

use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Ordered record of prior turns.
///
/// The only mutators are [`replace`](Self::replace) and
/// [`clear`](Self::clear); both swap the whole sequence, so the stored
/// history always equals what the last successful graph invocation (or a
/// reset) produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing sequence.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Copy of the current history.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Borrow the current history without copying.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Swap the stored history for `messages`.
    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Reset to an empty history.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

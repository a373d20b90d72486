//! Message Log
//!
//! Append-only, ordered record of the messages in one collaboration run.
//! Messages are never edited or removed once appended; callers that need a
//! bounded view go through [`HistoryReducer`](super::HistoryReducer).

use sdk::types::{Message, Speaker};

/// Append-only log of conversation messages
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    /// Messages in insertion order
    messages: Vec<Message>,

    /// Sequence number assigned to the next appended message
    next_sequence: u64,
}

impl MessageLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return it
    ///
    /// The log assigns the sequence number; sequences start at 0 and increase
    /// by one per append.
    pub fn append(&mut self, speaker: Speaker, content: impl Into<String>) -> &Message {
        let message = Message::new(speaker, content, self.next_sequence);
        self.next_sequence += 1;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// All messages, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recently appended message, or `None` before the seed is appended
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages produced by participants
    pub fn agent_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.speaker.participant().is_some())
            .count()
    }

    /// Consume the log and return every message except the user seed
    pub fn into_transcript(self) -> Vec<Message> {
        self.messages
            .into_iter()
            .filter(|m| m.speaker != Speaker::User)
            .collect()
    }
}

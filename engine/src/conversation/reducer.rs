//! History Window Reducer
//!
//! Bounds how much of the message log is passed to agents and policies. The
//! reducer keeps the most recent `target_count` messages in order and never
//! touches the canonical log; it only hands out a borrowed tail slice.

use sdk::errors::EngineError;
use sdk::types::Message;

/// Default number of messages exposed downstream
pub const DEFAULT_TARGET_COUNT: usize = 3;

/// Produces most-recent-N views of a message history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryReducer {
    target_count: usize,
}

impl HistoryReducer {
    /// Create a reducer keeping the last `target_count` messages
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if `target_count` is zero.
    pub fn new(target_count: usize) -> Result<Self, EngineError> {
        if target_count == 0 {
            return Err(EngineError::Config(
                "history_window must be at least 1".to_string(),
            ));
        }
        Ok(Self { target_count })
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// Most recent `target_count` messages, oldest first
    pub fn reduce<'a>(&self, messages: &'a [Message]) -> &'a [Message] {
        let start = messages.len().saturating_sub(self.target_count);
        &messages[start..]
    }
}

impl Default for HistoryReducer {
    fn default() -> Self {
        Self {
            target_count: DEFAULT_TARGET_COUNT,
        }
    }
}

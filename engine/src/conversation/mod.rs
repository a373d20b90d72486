//! Conversation state
//!
//! The canonical [`MessageLog`] of a run and the [`HistoryReducer`] that
//! produces bounded read views of it for agents and policies.

pub mod log;
pub mod reducer;

pub use log::MessageLog;
pub use reducer::HistoryReducer;

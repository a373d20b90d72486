//! Error types and handling
//!
//! This module provides the error types shared by the engine and by
//! collaborator implementations. [`EngineError`] covers setup-time failures
//! (configuration, providers, IO) and implements [`RoundtableErrorExt`], which
//! provides user-friendly hints and indicates whether errors are recoverable.
//!
//! [`InvocationError`] and [`PolicyError`] are the failure outcomes of the two
//! collaborator traits. The orchestrator never lets either escape a run: they
//! are converted into a terminal status plus a diagnostic transcript entry.

use thiserror::Error;

/// Trait for Roundtable error extensions
///
/// Provides additional context for errors, including user-friendly hints and
/// recoverability information.
pub trait RoundtableErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and never contains secrets
    /// such as API keys.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors typically require fixing configuration before trying again.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, RoundtableErrorExt};
///
/// let error = EngineError::Config("history_window must be at least 1".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(!error.is_recoverable());
///
/// let provider_error = EngineError::LLMProvider("connection refused".to_string());
/// assert!(provider_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RoundtableErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::LLMProvider(_) => "LLM provider unavailable. Check your API keys and network",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::LLMProvider(_) | Self::Io(_) => true,
        }
    }
}

/// Failure of an [`AgentInvoker`](crate::collaborator::AgentInvoker) call
///
/// The orchestrator treats every variant as a single invocation failure; the
/// variants exist so diagnostics can say what went wrong.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("{0} returned an empty reply")]
    EmptyReply(String),

    #[error("no agent is registered for participant {0}")]
    UnknownParticipant(String),

    #[error("timed out")]
    Timeout,
}

/// Failure of a [`PolicyEvaluator`](crate::collaborator::PolicyEvaluator) call
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("classifier provider error: {0}")]
    Provider(String),

    #[error("cannot classify an empty history")]
    EmptyHistory,

    #[error("no decision available: {0}")]
    Unavailable(String),

    #[error("classifier timed out")]
    Timeout,
}

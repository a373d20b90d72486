//! LLM Provider Abstraction Layer
//!
//! This module provides a common interface for the chat-completion backends
//! that power LLM-backed participants and classifiers (OpenAI-compatible
//! endpoints and Ollama). The [`LLMProvider`] trait defines the contract that
//! all providers implement, so the agent invoker and the policy evaluator work
//! with any of them transparently.

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::LLMConfig;

pub mod ollama;
pub mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Message sent to a chat-completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: ChatRole,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

/// Role of a chat message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Persona / instructions
    System,

    /// Anyone other than the model being called
    User,

    /// The model being called
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::System => write!(f, "system"),
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "ollama", "openai")
    fn name(&self) -> &str;

    /// Generate a completion for the conversation
    ///
    /// # Arguments
    /// * `messages` - System prompt followed by the conversation turns
    ///
    /// # Returns
    /// * `Ok(String)` - The model's reply text
    /// * `Err(LLMError)` - If the request fails
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Check if the provider is currently healthy and available
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Build the provider named by `llm.default_provider`
///
/// # Errors
///
/// Returns [`EngineError::Config`] for an unknown provider name.
pub fn build_provider(config: &LLMConfig) -> std::result::Result<Arc<dyn LLMProvider>, EngineError> {
    match config.default_provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIProvider::new(config.openai.clone()))),
        "ollama" => Ok(Arc::new(OllamaProvider::new(
            config.ollama.base_url.clone(),
            config.ollama.model.clone(),
        ))),
        other => Err(EngineError::Config(format!(
            "Unknown LLM provider '{}'",
            other
        ))),
    }
}

/// Fail with [`EngineError::LLMProvider`] when `provider` is not reachable
pub async fn ensure_healthy(provider: &dyn LLMProvider) -> std::result::Result<(), EngineError> {
    if provider.check_health().await {
        Ok(())
    } else {
        Err(EngineError::LLMProvider(format!(
            "{} provider failed its health check",
            provider.name()
        )))
    }
}

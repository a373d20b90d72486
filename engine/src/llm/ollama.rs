//! Ollama LLM Provider
//!
//! Talks to a local Ollama server (typically http://localhost:11434) through
//! the non-streaming `/api/chat` endpoint. No API key is required.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::{ChatMessage, LLMError, LLMProvider, Result};

/// Upper bound for a single request; the orchestrator's call timeout is usually tighter
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Ollama provider
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// Base URL without a trailing slash
    base_url: String,

    /// Model tag, e.g. "llama3.1:8b"
    model: String,

    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response to an error, preferring Ollama's own `error` text
    fn status_error(&self, status: StatusCode, body: &str) -> LLMError {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .map(|parsed| parsed.error)
            .unwrap_or_else(|_| body.to_string());

        match status {
            StatusCode::NOT_FOUND => LLMError::InvalidRequest(format!(
                "{} (try `ollama pull {}`)",
                detail, self.model
            )),
            s if s.is_server_error() => {
                LLMError::ProviderUnavailable(format!("Ollama error ({}): {}", s, detail))
            }
            _ => LLMError::InvalidRequest(detail),
        }
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn check_health(&self) -> bool {
        self.client
            .get(self.endpoint("/api/tags"))
            .send()
            .await
            .is_ok_and(|response| response.status().is_success())
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint("/api/chat"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else if e.is_connect() {
                    LLMError::ProviderUnavailable(format!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.base_url
                    ))
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.status_error(status, &body));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(format!("Failed to parse Ollama response: {}", e)))?;

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Ollama reply received"
        );

        Ok(reply.message.content)
    }
}

/// `/api/chat` request body; borrows the caller's messages
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

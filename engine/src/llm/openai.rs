//! OpenAI-compatible LLM Provider
//!
//! Talks to any endpoint that implements `POST {base_url}/chat/completions`
//! (OpenAI, Azure OpenAI deployments behind a gateway, local proxies). The
//! API key is read from the environment variable named in the config and is
//! never written to the config file.

use super::{ChatMessage, LLMError, LLMProvider, Result};
use crate::config::OpenAIConfig;
use async_trait::async_trait;
use serde_json::json;

pub struct OpenAIProvider {
    config: OpenAIConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a provider, reading the API key from `config.api_key_env`
    pub fn new(config: OpenAIConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self {
            config,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Use an explicit API key instead of the environment
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn check_health(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            LLMError::AuthenticationFailed(format!(
                "environment variable {} is not set",
                self.config.api_key_env
            ))
        })?;

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let api_messages: Vec<_> = messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.to_string(),
                    "content": msg.content
                })
            })
            .collect();

        let payload = json!({
            "model": self.config.model,
            "messages": api_messages,
        });

        let mut request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json");
        if let Some(header) = &self.config.api_key_header {
            request = request.header(header.as_str(), api_key);
        }

        let response = request.json(&payload).send().await.map_err(|e| {
            if e.is_timeout() {
                LLMError::Timeout
            } else if e.is_connect() {
                LLMError::ProviderUnavailable(format!("Cannot connect to {}", self.config.base_url))
            } else {
                LLMError::NetworkError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(LLMError::AuthenticationFailed(text));
            } else if status.as_u16() == 429 {
                return Err(LLMError::RateLimitExceeded);
            } else if status.is_server_error() {
                return Err(LLMError::ProviderUnavailable(format!(
                    "OpenAI API error ({}): {}",
                    status, text
                )));
            } else {
                return Err(LLMError::InvalidRequest(text));
            }
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        let message = choice
            .get("message")
            .ok_or_else(|| LLMError::ParseError("No message in choice".to_string()))?;

        message
            .get("content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| LLMError::ParseError("Empty content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_tracks_api_key() {
        let config = OpenAIConfig {
            api_key_env: "ROUNDTABLE_TEST_UNSET_OPENAI_KEY".to_string(),
            ..OpenAIConfig::default()
        };
        let provider = OpenAIProvider::new(config);
        assert_eq!(provider.name(), "openai");
        assert!(!provider.check_health().await);

        let provider = provider.with_api_key("sk-test");
        assert!(provider.check_health().await);
    }

    #[tokio::test]
    async fn test_missing_key_is_auth_failure() {
        let config = OpenAIConfig {
            api_key_env: "ROUNDTABLE_TEST_UNSET_OPENAI_KEY".to_string(),
            ..OpenAIConfig::default()
        };
        let provider = OpenAIProvider::new(config);

        let err = provider
            .generate(&[ChatMessage::user("hello")])
            .await
            .unwrap_err();
        match err {
            LLMError::AuthenticationFailed(msg) => {
                assert!(msg.contains("ROUNDTABLE_TEST_UNSET_OPENAI_KEY"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

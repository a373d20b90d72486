//! Configuration management
//!
//! This module handles loading, validation, and management of the Roundtable
//! configuration. Configuration is stored in TOML format at
//! ~/.roundtable/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **collaboration**: History window, turn budget, approval token, call timeout, policy mode
//! - **participants**: Ordered participant roster (last entry is the approver)
//! - **llm**: LLM provider settings
//!
//! `{approval_token}` inside participant instructions is replaced with the
//! configured approval token when the participant set is built.
//!
//! # Examples
//!
//! ```no_run
//! use roundtable_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from default location
//! let config = Config::load_or_create()?;
//!
//! // Access configuration values
//! println!("Turn budget: {}", config.collaboration.max_turns);
//! println!("Default provider: {}", config.llm.default_provider);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::orchestrator::{
    CollaborationSettings, DEFAULT_APPROVAL_TOKEN, DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_MAX_TURNS,
};
use crate::participants::{self, Participant, ParticipantSet, APPROVAL_TOKEN_PLACEHOLDER};

/// Main configuration structure
///
/// This structure represents the complete Roundtable configuration loaded
/// from ~/.roundtable/config.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Collaboration loop settings
    #[serde(default)]
    pub collaboration: CollaborationConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Participants in stage order
    #[serde(default = "default_participants")]
    pub participants: Vec<ParticipantConfig>,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Which evaluator drives turn selection and termination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Deterministic stage rules
    Rule,

    /// Classification prompts sent to the configured LLM
    Llm,
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyMode::Rule => write!(f, "rule"),
            PolicyMode::Llm => write!(f, "llm"),
        }
    }
}

/// Collaboration loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaborationConfig {
    /// Messages exposed to agents and policies
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Maximum agent turns per run
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Literal the approver uses to sign off
    #[serde(default = "default_approval_token")]
    pub approval_token: String,

    /// Timeout for each agent or classifier call (seconds)
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Policy evaluator used for selection and termination
    #[serde(default = "default_policy")]
    pub policy: PolicyMode,
}

impl Default for CollaborationConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            max_turns: default_max_turns(),
            approval_token: default_approval_token(),
            call_timeout_secs: default_call_timeout_secs(),
            policy: default_policy(),
        }
    }
}

/// One participant entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantConfig {
    /// Unique name, also the speaker label in transcripts
    pub name: String,

    /// Name shown to humans (defaults to `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Persona prompt
    pub instructions: String,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Default LLM provider (openai, ollama)
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// OpenAI-compatible provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            openai: OpenAIConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for the API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model (or deployment) name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,

    /// Extra header that also carries the key (e.g. `api-key` for Azure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_header: Option<String>,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_window() -> usize {
    crate::conversation::reducer::DEFAULT_TARGET_COUNT
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

fn default_approval_token() -> String {
    DEFAULT_APPROVAL_TOKEN.to_string()
}

fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}

fn default_policy() -> PolicyMode {
    PolicyMode::Rule
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_participants() -> Vec<ParticipantConfig> {
    participants::default_participants()
        .into_iter()
        .map(|p| ParticipantConfig {
            name: p.id.to_string(),
            display_name: Some(p.display_name),
            instructions: p.instructions,
        })
        .collect()
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            api_key_env: default_openai_api_key_env(),
            api_key_header: None,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.roundtable/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Directory creation fails
    /// - File write fails
    pub fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default_config();
        config.validate()?;

        let toml_string = config.to_toml()?;
        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.roundtable/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".roundtable").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig::default(),
            collaboration: CollaborationConfig::default(),
            llm: LLMConfig::default(),
            participants: default_participants(),
        }
    }

    /// Serialize to pretty TOML
    pub fn to_toml(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Settings for the orchestrator
    pub fn collaboration_settings(&self) -> CollaborationSettings {
        CollaborationSettings {
            history_window: self.collaboration.history_window,
            max_turns: self.collaboration.max_turns,
            approval_token: self.collaboration.approval_token.clone(),
            call_timeout: Duration::from_secs(self.collaboration.call_timeout_secs),
        }
    }

    /// Build the validated participant set
    ///
    /// `{approval_token}` in instructions is replaced with the configured token.
    pub fn participant_set(&self) -> Result<ParticipantSet, EngineError> {
        let token = &self.collaboration.approval_token;
        let participants = self
            .participants
            .iter()
            .map(|entry| {
                let participant = Participant::new(
                    entry.name.as_str(),
                    entry.instructions.replace(APPROVAL_TOKEN_PLACEHOLDER, token),
                );
                match &entry.display_name {
                    Some(display_name) => participant.with_display_name(display_name.as_str()),
                    None => participant,
                }
            })
            .collect();
        ParticipantSet::new(participants)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The log level or provider name is unknown
    /// - Collaboration settings are out of range
    /// - The participant roster is invalid
    pub fn validate(&self) -> Result<(), EngineError> {
        // Validate log level
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        // Validate default provider
        let valid_providers = ["openai", "ollama"];
        if !valid_providers.contains(&self.llm.default_provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid default provider '{}'. Must be one of: {}",
                self.llm.default_provider,
                valid_providers.join(", ")
            )));
        }

        if self.llm.openai.api_key_env.trim().is_empty() {
            return Err(EngineError::Config(
                "llm.openai.api_key_env must not be empty".to_string(),
            ));
        }

        self.collaboration_settings().validate()?;
        self.participant_set()?;

        Ok(())
    }
}

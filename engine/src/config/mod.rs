//! Configuration management
//!
//! This module handles loading and validation of the Parley configuration.
//! Configuration is read from TOML at `~/.parley/config.toml` when that file
//! exists; otherwise built-in defaults apply. Nothing is written back.
//!
//! # Configuration Sections
//!
//! - **core**: log level
//! - **llm**: model identifier, endpoints, request timeout
//! - **agent**: system preamble and tool-call round bound
//!
//! # Environment
//!
//! `MODEL_ID` overrides `llm.model`. Credentials never live in this file; see
//! [`crate::secrets`].
//!
//! # Examples
//!
//! ```no_run
//! use parley_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_default()?;
//! println!("Model: {}", config.llm.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MODEL_ID_VAR: &str = "MODEL_ID";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Model backend settings
    #[serde(default)]
    pub llm: LLMConfig,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Model identifier (OpenAI model name or Azure deployment name)
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for the OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// `api-version` query parameter for Azure OpenAI
    #[serde(default = "default_azure_api_version")]
    pub azure_api_version: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Agent loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// System preamble placed at the head of every conversation
    #[serde(default = "default_system_preamble")]
    pub system_preamble: String,

    /// Follow-up model calls allowed after tool execution, per message
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_azure_api_version() -> String {
    "2024-06-01".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_system_preamble() -> String {
    "You are a helpful AI assistant with smart home capabilities. \
     You can control lights in different locations using the available functions. \
     When users ask about lighting, use the appropriate functions to help them."
        .to_string()
}

fn default_max_tool_rounds() -> usize {
    crate::agent::DEFAULT_MAX_TOOL_ROUNDS
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            openai_base_url: default_openai_base_url(),
            azure_api_version: default_azure_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_preamble: default_system_preamble(),
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.parley/config.toml)
    ///
    /// Falls back to defaults when the file does not exist. Environment
    /// overrides are applied and the result is validated.
    pub fn load_or_default() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        let mut config = if config_path.exists() {
            Self::read(&config_path)?
        } else {
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
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
        let mut config = Self::read(path)?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Apply environment overrides through an arbitrary variable lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup(MODEL_ID_VAR).filter(|m| !m.trim().is_empty()) {
            self.llm.model = model.trim().to_string();
        }
    }

    /// Get the default configuration file path (~/.parley/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".parley").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.llm.model.trim().is_empty() {
            return Err(EngineError::Config("llm.model must not be empty".to_string()));
        }

        if self.llm.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm.request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.agent.system_preamble.trim().is_empty() {
            return Err(EngineError::Config(
                "agent.system_preamble must not be empty".to_string(),
            ));
        }

        if self.agent.max_tool_rounds == 0 {
            return Err(EngineError::Config(
                "agent.max_tool_rounds must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

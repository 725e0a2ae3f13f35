//! Credential acquisition
//!
//! API keys come from the environment only and are never written to disk.
//! Two backends are recognised:
//!
//! - Azure OpenAI: `AZURE_CLIENT_KEY` and `CLIENT_ENDPOINT`
//! - OpenAI: `CLIENT_KEY`
//!
//! Azure wins when both are present. Having neither is a configuration error.

use regex::Regex;
use sdk::errors::EngineError;
use std::fmt;
use std::sync::OnceLock;

pub const CLIENT_KEY_VAR: &str = "CLIENT_KEY";
pub const AZURE_CLIENT_KEY_VAR: &str = "AZURE_CLIENT_KEY";
pub const CLIENT_ENDPOINT_VAR: &str = "CLIENT_ENDPOINT";

/// A wrapper for sensitive string data that prevents accidental logging.
///
/// `Debug` and `Display` always print `[REDACTED]`; use `expose()` to read
/// the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the raw underlying string
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Backend credentials resolved at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    OpenAi { api_key: SecretString },
    Azure { api_key: SecretString, endpoint: String },
}

impl Credentials {
    /// Resolve credentials from the process environment
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(api_key) = non_empty(AZURE_CLIENT_KEY_VAR) {
            let endpoint = non_empty(CLIENT_ENDPOINT_VAR).ok_or_else(|| {
                EngineError::Config(format!(
                    "{} is set but {} is missing",
                    AZURE_CLIENT_KEY_VAR, CLIENT_ENDPOINT_VAR
                ))
            })?;
            return Ok(Self::Azure {
                api_key: SecretString::new(api_key),
                endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            });
        }

        if let Some(api_key) = non_empty(CLIENT_KEY_VAR) {
            return Ok(Self::OpenAi {
                api_key: SecretString::new(api_key),
            });
        }

        Err(EngineError::Config(format!(
            "No API credentials found. Set {} for OpenAI, or {} and {} for Azure OpenAI",
            CLIENT_KEY_VAR, AZURE_CLIENT_KEY_VAR, CLIENT_ENDPOINT_VAR
        )))
    }

    /// Backend name for logs and banners
    pub fn backend(&self) -> &'static str {
        match self {
            Self::OpenAi { .. } => "openai",
            Self::Azure { .. } => "azure",
        }
    }

    pub fn api_key(&self) -> &SecretString {
        match self {
            Self::OpenAi { api_key } | Self::Azure { api_key, .. } => api_key,
        }
    }
}

static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Patterns matched:
/// - OpenAI API keys: sk-[a-zA-Z0-9]{20,} (including sk-proj- variants)
/// - Bearer tokens: Bearer\s+[^\s]{20,}
/// - Azure-style 32 hex character keys
fn secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"sk-[a-zA-Z0-9\-_]{20,}").expect("Invalid OpenAI pattern"),
            Regex::new(r"Bearer\s+[^\s]{20,}").expect("Invalid Bearer pattern"),
            Regex::new(r"\b[0-9a-fA-F]{32}\b").expect("Invalid Azure key pattern"),
        ]
    })
}

/// Replace anything that looks like a credential with `[REDACTED]`
///
/// Used on backend error bodies before they reach logs or the console.
pub fn scrub(text: &str) -> String {
    secret_patterns()
        .iter()
        .fold(text.to_string(), |acc, pattern| {
            pattern.replace_all(&acc, "[REDACTED]").to_string()
        })
}

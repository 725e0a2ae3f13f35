//! Capability input types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Arguments handed to a capability invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInput {
    pub params: HashMap<String, serde_json::Value>,
}

impl ToolInput {
    /// Create an empty ToolInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Get a string parameter
    ///
    /// Numbers and booleans are accepted and rendered as text, since models
    /// occasionally send `"2"` as `2`.
    pub fn param_str(&self, key: &str) -> Result<String, ToolError> {
        match self.params.get(key) {
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => {
                Ok(v.to_string())
            }
            Some(other) => Err(ToolError::InvalidArgument(format!(
                "{} must be a string, got {}",
                key, other
            ))),
            None => Err(ToolError::InvalidArgument(format!("missing parameter: {}", key))),
        }
    }
}

/// Capability-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Execution failure: {0}")]
    ExecutionFailure(String),
}

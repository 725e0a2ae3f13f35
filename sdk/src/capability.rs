//! Capability contract
//!
//! A capability is a named, schema-described callable the model may ask the
//! engine to run. The engine never looks past the descriptor: how a
//! capability does its work is entirely up to the implementor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{ToolError, ToolInput};

/// One declared parameter of a capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl ParameterSpec {
    /// A parameter the model must always supply
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }

    /// A parameter the model may omit
    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }
}

/// Declared shape of a capability, advertised to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,

    /// Parameters in declaration order
    pub parameters: Vec<ParameterSpec>,
}

impl CapabilityDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter to the schema
    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Check that every required parameter is present in `input`
    pub fn check_required(&self, input: &ToolInput) -> Result<(), ToolError> {
        let missing: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required && !input.params.contains_key(&p.name))
            .map(|p| p.name.as_str())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ToolError::InvalidArgument(format!(
                "missing required parameter(s): {}",
                missing.join(", ")
            )))
        }
    }
}

/// A callable exposed to the model
///
/// Implementations are registered once at startup and must not change their
/// descriptor afterwards.
#[async_trait]
pub trait Capability: Send + Sync {
    /// The descriptor advertised to the model
    fn descriptor(&self) -> &CapabilityDescriptor;

    /// Run the capability with the model-supplied arguments
    async fn invoke(&self, input: ToolInput) -> Result<String, ToolError>;
}

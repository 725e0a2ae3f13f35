pub mod lights;

pub use lights::light_capabilities;

use std::collections::BTreeMap;
use std::sync::Arc;

use sdk::capability::{Capability, CapabilityDescriptor};
use sdk::errors::EngineError;
use sdk::types::{ToolError, ToolInput};
use tracing::{debug, warn};

use crate::llm::ToolCall;

/// Prefix of every tool result that records a failure instead of output.
///
/// The model sees it on the follow-up call and can recover.
pub const FAILURE_MARKER: &str = "ERROR:";

/// Registry of capabilities the model may invoke.
///
/// Built once by the embedding application before the session starts and
/// immutable afterwards. Names are unique.
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: BTreeMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    /// Create an empty registry with no capabilities.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start building a registry.
    pub fn builder() -> CapabilityRegistryBuilder {
        CapabilityRegistryBuilder {
            registry: Self::empty(),
        }
    }

    /// Find a capability by its exact name.
    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.capabilities.get(name)
    }

    /// Descriptors of all registered capabilities, sorted by name.
    pub fn descriptors(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.capabilities.values().map(|c| c.descriptor())
    }

    /// Names of all registered capabilities, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.capabilities.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Invoke the capability a tool call names.
    ///
    /// Required parameters are checked against the descriptor before the
    /// capability runs.
    pub async fn invoke(&self, call: &ToolCall) -> Result<String, EngineError> {
        debug!("Dispatching capability '{}' ({})", call.name, call.id);

        let Some(capability) = self.lookup(&call.name) else {
            warn!("Unknown capability requested: {}", call.name);
            return Err(EngineError::CapabilityNotFound(call.name.clone()));
        };

        let input = call
            .arguments
            .iter()
            .fold(ToolInput::new(), |input, (key, value)| {
                input.with_param(key, value.clone())
            });

        let failed = |e: ToolError| EngineError::CapabilityFailed {
            name: call.name.clone(),
            reason: e.to_string(),
        };

        capability.descriptor().check_required(&input).map_err(failed)?;
        capability.invoke(input).await.map_err(failed)
    }

    /// Render an invocation failure as tool result content.
    pub fn failure_content(&self, err: &EngineError) -> String {
        match err {
            EngineError::CapabilityNotFound(name) => format!(
                "{} capability '{}' not found. Available capabilities: {}",
                FAILURE_MARKER,
                name,
                self.names().join(", ")
            ),
            other => format!("{} {}", FAILURE_MARKER, other),
        }
    }
}

/// Builder that rejects duplicate capability names.
pub struct CapabilityRegistryBuilder {
    registry: CapabilityRegistry,
}

impl CapabilityRegistryBuilder {
    /// Register one capability.
    pub fn register(mut self, capability: Arc<dyn Capability>) -> Result<Self, EngineError> {
        let name = capability.descriptor().name.clone();
        if self.registry.capabilities.contains_key(&name) {
            return Err(EngineError::DuplicateCapability(name));
        }
        debug!("Registered capability '{}'", name);
        self.registry.capabilities.insert(name, capability);
        Ok(self)
    }

    /// Register several capabilities in order.
    pub fn register_all(
        self,
        capabilities: impl IntoIterator<Item = Arc<dyn Capability>>,
    ) -> Result<Self, EngineError> {
        capabilities
            .into_iter()
            .try_fold(self, |builder, capability| builder.register(capability))
    }

    pub fn build(self) -> CapabilityRegistry {
        self.registry
    }
}

//! Parley SDK
//!
//! Shared contracts between the Parley engine and the capabilities it hosts.

/// Capability trait and descriptor types
pub mod capability;

/// Error types and handling
pub mod errors;

/// Capability input types
pub mod types;

// Re-export commonly used types
pub use capability::{Capability, CapabilityDescriptor, ParameterSpec};
pub use errors::{EngineError, ParleyErrorExt};
pub use types::{ToolError, ToolInput};

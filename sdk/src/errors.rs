//! Error types and handling
//!
//! This module provides the error types used throughout the Parley engine.
//! All errors implement the `ParleyErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages never carry credentials. Backend failures are reported with
//! the provider's message, which must not echo API keys.

use thiserror::Error;

/// Trait for Parley error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait ParleyErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors are reported and the session continues. Everything
    /// else ends the process.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: missing credentials or invalid settings (fatal)
/// - **Backend**: the language model could not be reached or answered badly
/// - **Capability**: a requested capability is unknown or failed
/// - **Agent loop**: the tool-call round bound was exceeded
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, ParleyErrorExt};
///
/// let error = EngineError::CapabilityNotFound("Dim".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::Config("CLIENT_KEY is not set".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Model backend errors
    #[error("Backend error: {0}")]
    Backend(String),

    // Capability errors
    #[error("Capability not found: {0}")]
    CapabilityNotFound(String),

    #[error("Capability '{name}' failed: {reason}")]
    CapabilityFailed { name: String, reason: String },

    #[error("Capability already registered: {0}")]
    DuplicateCapability(String),

    // Agent loop errors
    #[error("Tool-call round limit of {limit} reached")]
    ToolCallOverrun { limit: usize },

    // Console stream errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParleyErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => {
                "Set CLIENT_KEY for OpenAI, or AZURE_CLIENT_KEY and CLIENT_ENDPOINT for Azure OpenAI"
            }
            Self::Backend(_) => "The model backend is unavailable. Check your API key and network",
            Self::CapabilityNotFound(_) => "The model asked for a capability that is not registered",
            Self::CapabilityFailed { .. } => "A capability failed while handling the request",
            Self::DuplicateCapability(_) => "Each capability name may only be registered once",
            Self::ToolCallOverrun { .. } => {
                "The request needed more tool calls than allowed. Try a simpler request"
            }
            Self::Io(_) => "Console input or output failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) | Self::DuplicateCapability(_) | Self::Io(_) => false,
            _ => true,
        }
    }
}

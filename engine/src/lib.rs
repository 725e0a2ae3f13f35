//! Parley Engine Library
//!
//! This library provides the core functionality of the Parley chat agent.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Credential resolution and redaction
pub mod secrets;

/// Model client abstraction layer
pub mod llm;

/// Conversation state and turn processing
pub mod agent;

/// Capability registry and built-in capabilities
pub mod tools;

/// Interactive console: command dispatch and the session loop
pub mod console;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

//! Agent Loop Core
//!
//! This module holds the conversation transcript and the processor that runs
//! one user message through the model, executing any requested capabilities
//! before asking the model for its final reply.

pub mod conversation;
pub mod processor;

pub use conversation::ConversationState;
pub use processor::{TurnProcessor, DEFAULT_MAX_TOOL_ROUNDS, EMPTY_REPLY_FALLBACK};

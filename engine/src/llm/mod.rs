//! Model Client Abstraction Layer
//!
//! This module defines the transcript types shared by the agent loop and every
//! backend, and the `ModelClient` trait the agent loop talks to. A backend
//! receives the whole transcript plus the capability registry and answers with
//! either a text reply or an ordered batch of capability invocation requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tools::CapabilityRegistry;
use sdk::errors::EngineError;

pub mod openai;

/// Result type for model client operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors a model backend can surface
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<LlmError> for EngineError {
    fn from(err: LlmError) -> Self {
        EngineError::Backend(err.to_string())
    }
}

/// Role of a transcript entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    ToolResult,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::ToolResult => write!(f, "tool"),
        }
    }
}

/// A capability invocation request issued by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Backend-assigned identifier used to pair the call with its result
    pub id: String,

    /// Name of the capability to invoke
    pub name: String,

    /// Arguments by parameter name
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One entry of the conversation transcript
///
/// Turns are immutable once built. The only way to create a system turn is
/// through `ConversationState`, which keeps it at the head of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    produced_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    call_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCall>,
}

impl Turn {
    pub(crate) fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    /// Create a new user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    /// Create a new assistant text turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Record the batch of invocation requests the assistant issued
    pub fn assistant_tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            produced_by: None,
            call_id: None,
            tool_calls: calls,
        }
    }

    /// Create a tool result turn answering `call`
    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            role: Role::ToolResult,
            content: content.into(),
            produced_by: Some(call.name.clone()),
            call_id: Some(call.id.clone()),
            tool_calls: Vec::new(),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            produced_by: None,
            call_id: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Name of the capability that produced a tool result
    pub fn produced_by(&self) -> Option<&str> {
        self.produced_by.as_deref()
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }

    /// Invocation requests recorded on an assistant turn
    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }
}

/// Outcome of one model call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingResponse {
    /// The model answered with text
    TextReply { content: String },

    /// The model wants capabilities invoked, in this order
    ToolCalls { calls: Vec<ToolCall> },
}

impl PendingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self::TextReply {
            content: content.into(),
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self::ToolCalls { calls }
    }
}

/// Language model backend as seen by the agent loop
///
/// Implementations own their transport, credentials and timeouts. The agent
/// loop imposes none.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Returns the name of the backend (e.g., "openai", "azure")
    fn name(&self) -> &str;

    /// Opaque model identifier, shown to the user at startup
    fn model(&self) -> &str;

    /// Send the transcript and registered capabilities, get the next response
    async fn converse(
        &self,
        transcript: &[Turn],
        registry: &CapabilityRegistry,
    ) -> Result<PendingResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_turn_creation() {
        let user = Turn::user("Hello");
        assert_eq!(user.role(), Role::User);
        assert_eq!(user.content(), "Hello");
        assert_eq!(user.produced_by(), None);

        let assistant = Turn::assistant("Hi there");
        assert_eq!(assistant.role(), Role::Assistant);
        assert!(assistant.tool_calls().is_empty());

        let system = Turn::system("You are a helpful assistant");
        assert_eq!(system.role(), Role::System);
    }

    #[test]
    fn test_tool_result_carries_origin() {
        let call = ToolCall::new("call_1", "TurnOnLight", args(json!({"location": "kitchen"})));
        let turn = Turn::tool_result(&call, "The light in the kitchen has been turned ON.");

        assert_eq!(turn.role(), Role::ToolResult);
        assert_eq!(turn.produced_by(), Some("TurnOnLight"));
        assert_eq!(turn.call_id(), Some("call_1"));
    }

    #[test]
    fn test_assistant_tool_calls_keep_order() {
        let calls = vec![
            ToolCall::new("a", "TurnOnLight", serde_json::Map::new()),
            ToolCall::new("b", "TurnOffLight", serde_json::Map::new()),
        ];
        let turn = Turn::assistant_tool_calls(calls.clone());
        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.content(), "");
        assert_eq!(turn.tool_calls(), calls.as_slice());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::ToolResult.to_string(), "tool");
        assert_eq!(Role::System.to_string(), "system");
    }

    #[test]
    fn test_pending_response_serialization() {
        let reply = PendingResponse::text("done");
        let json = serde_json::to_string(&reply).unwrap();
        assert!(json.contains(r#""type":"text_reply"#));

        let calls = PendingResponse::tool_calls(vec![ToolCall::new(
            "id",
            "name",
            serde_json::Map::new(),
        )]);
        let json = serde_json::to_string(&calls).unwrap();
        assert!(json.contains(r#""type":"tool_calls"#));
    }

    #[test]
    fn test_llm_error_becomes_backend_error() {
        let err: EngineError = LlmError::BackendUnavailable("connection refused".into()).into();
        assert!(matches!(err, EngineError::Backend(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}

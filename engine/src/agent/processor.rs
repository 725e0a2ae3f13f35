//! Turn Processor
//!
//! Drives one conversational exchange through the two-phase tool protocol:
//!
//! 1. Append the user turn and call the model
//! 2. If the model answers with text, record it and return it
//! 3. If the model asks for capabilities, run the batch in order, record every
//!    result (failures included), then call the model again
//! 4. Stop after `max_tool_rounds` follow-up calls
//!
//! # Limits
//!
//! - One follow-up round per exchange unless configured otherwise
//! - No local timeout: the model client owns its transport deadlines
//!
//! A failed model call leaves the transcript as it was before that call.

use std::sync::Arc;
use std::time::Instant;

use sdk::errors::EngineError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::llm::{LlmError, ModelClient, PendingResponse, Role, ToolCall, Turn};
use crate::tools::CapabilityRegistry;

use super::ConversationState;

/// Shown when the model's final reply is blank
pub const EMPTY_REPLY_FALLBACK: &str = "I processed your request.";

/// Follow-up model calls allowed after tool execution, per exchange
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 1;

/// Executes request/response/tool cycles against a model client
pub struct TurnProcessor {
    client: Arc<dyn ModelClient>,
    max_tool_rounds: usize,
}

impl TurnProcessor {
    /// Create a processor with the default round bound
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Allow more follow-up rounds per exchange (minimum 1)
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds.max(1);
        self
    }

    pub fn max_tool_rounds(&self) -> usize {
        self.max_tool_rounds
    }

    pub fn client(&self) -> &Arc<dyn ModelClient> {
        &self.client
    }

    /// Run one exchange and return the text to show the user
    ///
    /// Errors are model failures only. Capability failures are recorded in the
    /// transcript and do not end the exchange. A round overrun returns the
    /// best partial text with a truncation note.
    pub async fn handle_user_message(
        &self,
        user_text: &str,
        state: &mut ConversationState,
        registry: &CapabilityRegistry,
    ) -> Result<String, EngineError> {
        let exchange_id = Uuid::new_v4();
        let start_time = Instant::now();
        info!("Starting exchange {}", exchange_id);

        state.append(Turn::user(user_text));

        let mut response = self.converse(state, registry).await?;
        let mut rounds = 0;

        loop {
            match response {
                PendingResponse::TextReply { content } => {
                    info!(
                        "Exchange {} completed in {}ms after {} tool round(s)",
                        exchange_id,
                        start_time.elapsed().as_millis(),
                        rounds
                    );
                    return Ok(Self::finish(content, state));
                }
                PendingResponse::ToolCalls { calls } => {
                    if calls.is_empty() {
                        error!("Model returned an empty tool call batch");
                        return Err(LlmError::MalformedResponse(
                            "tool call batch is empty".to_string(),
                        )
                        .into());
                    }

                    if rounds >= self.max_tool_rounds {
                        let overrun = EngineError::ToolCallOverrun {
                            limit: self.max_tool_rounds,
                        };
                        warn!("Exchange {}: {}", exchange_id, overrun);
                        return Ok(self.truncated(state));
                    }

                    self.execute_batch(calls, state, registry).await;
                    rounds += 1;
                    debug!(
                        "Exchange {} round {}/{}",
                        exchange_id, rounds, self.max_tool_rounds
                    );

                    response = self.converse(state, registry).await?;
                }
            }
        }
    }

    async fn converse(
        &self,
        state: &ConversationState,
        registry: &CapabilityRegistry,
    ) -> Result<PendingResponse, EngineError> {
        debug!(
            "Calling {} with {} turns (~{} tokens)",
            self.client.name(),
            state.len(),
            state.estimated_tokens()
        );

        self.client
            .converse(state.snapshot(), registry)
            .await
            .map_err(|e| {
                error!("Model call failed: {}", e);
                e.into()
            })
    }

    /// Run every call in order and record one result turn per call
    async fn execute_batch(
        &self,
        calls: Vec<ToolCall>,
        state: &mut ConversationState,
        registry: &CapabilityRegistry,
    ) {
        state.append(Turn::assistant_tool_calls(calls.clone()));

        for call in &calls {
            let content = match registry.invoke(call).await {
                Ok(output) => output,
                Err(e) => {
                    warn!("Capability call {} failed: {}", call.id, e);
                    registry.failure_content(&e)
                }
            };
            state.append(Turn::tool_result(call, content));
        }
    }

    fn finish(content: String, state: &mut ConversationState) -> String {
        if content.trim().is_empty() {
            debug!("Blank reply, not recorded");
            return EMPTY_REPLY_FALLBACK.to_string();
        }
        state.append(Turn::assistant(content.clone()));
        content
    }

    /// Latest tool output of the current exchange plus a truncation note
    fn truncated(&self, state: &ConversationState) -> String {
        let partial = state
            .snapshot()
            .iter()
            .rev()
            .take_while(|t| t.role() != Role::User)
            .find(|t| t.role() == Role::ToolResult)
            .map(|t| t.content().to_string())
            .unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string());

        format!(
            "{}\n(exchange truncated: tool-call round limit of {} reached)",
            partial, self.max_tool_rounds
        )
    }
}

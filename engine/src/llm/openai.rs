//! OpenAI-compatible chat completions client
//!
//! Speaks to either the OpenAI API or an Azure OpenAI deployment, depending on
//! which credentials were found. Capabilities are advertised as `tools`, and
//! the model's `tool_calls` come back as a `PendingResponse::ToolCalls` batch.

use super::{LlmError, ModelClient, PendingResponse, Role, ToolCall, Turn};
use crate::config::LLMConfig;
use crate::secrets::{self, Credentials};
use crate::tools::CapabilityRegistry;
use async_trait::async_trait;
use sdk::errors::EngineError;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub struct OpenAIClient {
    client: reqwest::Client,
    credentials: Credentials,
    model: String,
    openai_base_url: String,
    azure_api_version: String,
}

impl OpenAIClient {
    pub fn new(credentials: Credentials, config: &LLMConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| EngineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            model: config.model.clone(),
            openai_base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            azure_api_version: config.azure_api_version.clone(),
        })
    }

    fn url(&self) -> String {
        match &self.credentials {
            Credentials::OpenAi { .. } => format!("{}/chat/completions", self.openai_base_url),
            Credentials::Azure { endpoint, .. } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint, self.model, self.azure_api_version
            ),
        }
    }

    fn request(&self) -> reqwest::RequestBuilder {
        let builder = self.client.post(self.url());
        match &self.credentials {
            Credentials::OpenAi { api_key } => {
                builder.header("Authorization", format!("Bearer {}", api_key.expose()))
            }
            Credentials::Azure { api_key, .. } => builder.header("api-key", api_key.expose()),
        }
    }

    pub(crate) fn build_payload(&self, transcript: &[Turn], registry: &CapabilityRegistry) -> Value {
        let messages: Vec<Value> = transcript.iter().map(message_json).collect();

        let mut payload = json!({
            "model": self.model,
            "messages": messages,
        });

        if !registry.is_empty() {
            let tools: Vec<Value> = registry
                .descriptors()
                .map(|d| {
                    let properties: serde_json::Map<String, Value> = d
                        .parameters
                        .iter()
                        .map(|p| {
                            (
                                p.name.clone(),
                                json!({ "type": "string", "description": p.description }),
                            )
                        })
                        .collect();
                    let required: Vec<&str> = d
                        .parameters
                        .iter()
                        .filter(|p| p.required)
                        .map(|p| p.name.as_str())
                        .collect();

                    json!({
                        "type": "function",
                        "function": {
                            "name": d.name,
                            "description": d.description,
                            "parameters": {
                                "type": "object",
                                "properties": properties,
                                "required": required,
                            }
                        }
                    })
                })
                .collect();

            payload["tools"] = Value::Array(tools);
            payload["tool_choice"] = json!("auto");
        }

        payload
    }
}

fn message_json(turn: &Turn) -> Value {
    match turn.role() {
        Role::Assistant if !turn.tool_calls().is_empty() => {
            let calls: Vec<Value> = turn
                .tool_calls()
                .iter()
                .map(|c| {
                    json!({
                        "id": c.id,
                        "type": "function",
                        "function": {
                            "name": c.name,
                            "arguments": Value::Object(c.arguments.clone()).to_string(),
                        }
                    })
                })
                .collect();
            json!({ "role": "assistant", "content": Value::Null, "tool_calls": calls })
        }
        Role::ToolResult => json!({
            "role": "tool",
            "tool_call_id": turn.call_id().unwrap_or_default(),
            "content": turn.content(),
        }),
        role => json!({ "role": role.to_string(), "content": turn.content() }),
    }
}

pub(crate) fn parse_response(data: &Value) -> super::Result<PendingResponse> {
    let message = data
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .ok_or_else(|| LlmError::MalformedResponse("No message in response".to_string()))?;

    if let Some(raw_calls) = message.get("tool_calls").and_then(|c| c.as_array()) {
        if !raw_calls.is_empty() {
            let calls = raw_calls
                .iter()
                .map(parse_tool_call)
                .collect::<super::Result<Vec<_>>>()?;
            return Ok(PendingResponse::tool_calls(calls));
        }
    }

    match message.get("content") {
        Some(Value::String(content)) => Ok(PendingResponse::text(content.clone())),
        Some(Value::Null) | None => Ok(PendingResponse::text("")),
        Some(other) => Err(LlmError::MalformedResponse(format!(
            "Unexpected content: {}",
            other
        ))),
    }
}

fn parse_tool_call(raw: &Value) -> super::Result<ToolCall> {
    let function = raw
        .get("function")
        .ok_or_else(|| LlmError::MalformedResponse("Tool call without function".to_string()))?;

    let name = function
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| LlmError::MalformedResponse("Tool call without name".to_string()))?;

    let id = raw
        .get("id")
        .and_then(|i| i.as_str())
        .map(String::from)
        .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4()));

    let raw_args = function
        .get("arguments")
        .and_then(|a| a.as_str())
        .unwrap_or_default();

    let arguments = if raw_args.trim().is_empty() {
        serde_json::Map::new()
    } else {
        match serde_json::from_str::<Value>(raw_args) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(LlmError::MalformedResponse(format!(
                    "Arguments for '{}' are not an object: {}",
                    name, other
                )))
            }
            Err(e) => {
                return Err(LlmError::MalformedResponse(format!(
                    "Arguments for '{}' are not valid JSON: {}",
                    name, e
                )))
            }
        }
    };

    Ok(ToolCall::new(id, name, arguments))
}

#[async_trait]
impl ModelClient for OpenAIClient {
    fn name(&self) -> &str {
        self.credentials.backend()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn converse(
        &self,
        transcript: &[Turn],
        registry: &CapabilityRegistry,
    ) -> super::Result<PendingResponse> {
        let payload = self.build_payload(transcript, registry);
        debug!("POST {} with {} messages", self.name(), transcript.len());

        let response = self
            .request()
            .json(&payload)
            .send()
            .await
            .map_err(|e| LlmError::BackendUnavailable(secrets::scrub(&e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let text = secrets::scrub(&response.text().await.unwrap_or_default());

            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailure(text),
                _ => LlmError::BackendUnavailable(format!("HTTP {}: {}", status.as_u16(), text)),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        parse_response(&data)
    }
}

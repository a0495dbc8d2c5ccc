//! LLM backend contract
//!
//! The reasoning loop talks to an external OpenAI-compatible chat-completions
//! API. The trait keeps the loop testable with scripted backends; the wire
//! types cover the tool-calling subset of the protocol we use.

pub mod openai;

pub use openai::HttpBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One message in the conversation sent to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user", "assistant" or "tool"
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool invocations requested by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    /// Links a tool-result message back to the call that produced it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: ToolCallFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    /// JSON-encoded argument object, passed through as the model supplied it
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

/// Wire-format declaration of one callable tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDecl {
    #[serde(rename = "type")]
    pub decl_type: String,
    pub function: ToolFunctionDecl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunctionDecl {
    pub name: String,
    pub description: String,
    /// JSON Schema for the single string parameter
    pub parameters: serde_json::Value,
}

/// What the backend produced for one round: either tool invocations to run,
/// or the final free-text answer.
#[derive(Debug, Clone)]
pub enum BackendResponse {
    ToolCalls(Vec<ToolCallRequest>),
    Final(String),
}

/// Failures talking to the model backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("backend request timed out")]
    Timeout,

    #[error("backend API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("backend response carried neither tool calls nor content")]
    MissingContent,
}

impl BackendError {
    /// Transport-level failures are worth one more attempt; API rejections
    /// are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Http(_) | BackendError::Timeout)
    }
}

/// An external text-completion service that may request tool calls.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Run one completion round over the full message history.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDecl],
    ) -> Result<BackendResponse, BackendError>;

    /// Model identifier, for the health endpoint and logs.
    fn model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_message_shape() {
        let msg = ChatMessage::tool_result("call_1", "8 similar changes found");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_1");
        assert!(json.get("tool_calls").is_none());
    }

    #[test]
    fn test_user_message_omits_tool_fields() {
        let json = serde_json::to_value(ChatMessage::user("analyze this")).unwrap();
        assert!(json.get("tool_call_id").is_none());
        assert!(json.get("tool_calls").is_none());
    }

    #[test]
    fn test_tool_call_deserializes_without_type() {
        // Some compat servers omit the "type" discriminator.
        let call: ToolCallRequest = serde_json::from_str(
            r#"{"id": "c1", "function": {"name": "detect_conflicts", "arguments": "{}"}}"#,
        )
        .unwrap();
        assert_eq!(call.call_type, "function");
        assert_eq!(call.function.name, "detect_conflicts");
    }
}

//! OpenAI-compatible chat-completions client
//!
//! Works against any server speaking the chat-completions protocol with
//! function tools; the default deployment points at Gemini's
//! OpenAI-compatibility endpoint. Decoding is pinned to temperature 0 so
//! repeated assessments of the same change stay as stable as the backend
//! allows.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{BackendError, BackendResponse, ChatMessage, LlmBackend, ToolCallRequest, ToolDecl};
use crate::config::LlmConfig;

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Shared, stateless client for the configured chat-completions endpoint.
pub struct HttpBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_attempts: u32,
}

impl HttpBackend {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_attempts: 3,
        })
    }

    async fn try_chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDecl],
    ) -> Result<BackendResponse, BackendError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            temperature: 0.0,
            messages,
            tools: if tools.is_empty() { None } else { Some(tools) },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout
                } else {
                    BackendError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        let message = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or(BackendError::MissingContent)?;

        if let Some(calls) = message.tool_calls.filter(|c| !c.is_empty()) {
            debug!(count = calls.len(), "Backend requested tool calls");
            return Ok(BackendResponse::ToolCalls(calls));
        }
        match message.content {
            Some(text) if !text.is_empty() => Ok(BackendResponse::Final(text)),
            _ => Err(BackendError::MissingContent),
        }
    }
}

#[async_trait]
impl LlmBackend for HttpBackend {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDecl],
    ) -> Result<BackendResponse, BackendError> {
        let mut last_err = None;
        for attempt in 1..=self.max_attempts {
            match self.try_chat(messages, tools).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(attempt, error = %e, "Transient backend failure, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or(BackendError::MissingContent))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDecl]>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallRequest>>,
}

//! Reasoning orchestrator
//!
//! Drives the "model may request lookups, then must answer" loop against the
//! LLM backend as an explicit state machine with a hard round bound. One
//! round = one backend call; the loop either ends in a final free-text
//! answer or fails for the whole request, never partially.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::{
    BackendError, BackendResponse, ChatMessage, LlmBackend, ToolCallRequest, ToolDecl,
};
use crate::tools::ToolRegistry;

/// Instruction framing the model as a change-risk analyst. States the five
/// assessment criteria and the advisory score bands; the bands agree with
/// the authoritative thresholds applied after extraction.
pub const SYSTEM_INSTRUCTION: &str = "\
You are an expert Change Risk Management Analyst AI with deep expertise in IT operations and risk assessment.

Your task is to analyze change requests and provide comprehensive risk assessments by:
1. Querying historical data for similar changes
2. Checking configuration dependencies and impact scope
3. Detecting scheduling conflicts
4. Calculating weighted risk scores
5. Providing actionable recommendations

RISK ASSESSMENT CRITERIA:
- Complexity: Team count, technical difficulty, scope
- Historical Success: Past performance of similar changes
- Testing Coverage: Quality and extent of validation
- Service Impact: Downtime, user impact, criticality
- Mitigation: Rollback plans and safety measures

RISK LEVELS:
- LOW (0-25): Routine change, minimal impact
- MODERATE (26-50): Standard change with some risk
- HIGH (51-75): Complex change requiring approval
- CRITICAL (76-100): High-risk change requiring CAB review

Use the available tools to gather information, then state the final risk score \
as a number out of 100 (for example \"Score: 62/100\") together with your analysis.";

/// Failures of one reasoning run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("reasoning loop exceeded {0} rounds without a final answer")]
    RoundLimitExceeded(u32),
}

enum LoopState {
    AwaitingModel,
    ExecutingTools(Vec<ToolCallRequest>),
    Done(String),
    Failed(OrchestratorError),
}

/// Owns one backend, one tool registry and the loop bound; stateless across
/// runs and safe to share behind an `Arc`.
pub struct Orchestrator {
    backend: Arc<dyn LlmBackend>,
    registry: Arc<ToolRegistry>,
    declarations: Vec<ToolDecl>,
    max_rounds: u32,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn LlmBackend>, registry: Arc<ToolRegistry>, max_rounds: u32) -> Self {
        let declarations = registry.declarations();
        Self {
            backend,
            registry,
            declarations,
            max_rounds,
        }
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Run the loop for one rendered change query and return the model's
    /// final free-text answer.
    pub async fn run(&self, user_query: &str) -> Result<String, OrchestratorError> {
        let mut messages = vec![
            ChatMessage::system(SYSTEM_INSTRUCTION),
            ChatMessage::user(user_query),
        ];
        let mut rounds = 0u32;
        let mut state = LoopState::AwaitingModel;

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    if rounds >= self.max_rounds {
                        LoopState::Failed(OrchestratorError::RoundLimitExceeded(self.max_rounds))
                    } else {
                        rounds += 1;
                        debug!(round = rounds, history = messages.len(), "Calling backend");
                        match self.backend.chat(&messages, &self.declarations).await {
                            Ok(BackendResponse::ToolCalls(calls)) => {
                                LoopState::ExecutingTools(calls)
                            }
                            Ok(BackendResponse::Final(text)) => LoopState::Done(text),
                            Err(e) => LoopState::Failed(e.into()),
                        }
                    }
                }
                LoopState::ExecutingTools(calls) => {
                    messages.push(ChatMessage::assistant_tool_calls(calls.clone()));
                    for call in &calls {
                        let argument = self.call_argument(call);
                        let report = match self.registry.execute(&call.function.name, &argument) {
                            Ok(report) => report,
                            // A failed lookup becomes data for the model to
                            // reason around, not an aborted request.
                            Err(e) => {
                                warn!(tool = %call.function.name, error = %e, "Lookup failed");
                                format!("lookup failed: {e}")
                            }
                        };
                        messages.push(ChatMessage::tool_result(call.id.clone(), report));
                    }
                    LoopState::AwaitingModel
                }
                LoopState::Done(text) => return Ok(text),
                LoopState::Failed(err) => return Err(err),
            };
        }
    }

    /// Recover the single string argument from whatever the backend sent.
    /// The call is always attempted: the declared parameter if present,
    /// otherwise the first string in the object, otherwise the raw text.
    fn call_argument(&self, call: &ToolCallRequest) -> String {
        let raw = call.function.arguments.as_str();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
            return raw.to_string();
        };
        match value {
            serde_json::Value::Object(map) => {
                if let Some(param) = self.registry.get(&call.function.name).map(|t| t.parameter) {
                    if let Some(s) = map.get(param).and_then(|v| v.as_str()) {
                        return s.to_string();
                    }
                }
                map.values()
                    .find_map(|v| v.as_str().map(str::to_string))
                    .unwrap_or_else(|| raw.to_string())
            }
            serde_json::Value::String(s) => s,
            _ => raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ToolCallFunction;
    use crate::tools::default_registry;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Backend that replays a script of responses and records every
    /// message history it was sent.
    struct ScriptedBackend {
        script: Mutex<Vec<Result<BackendResponse, BackendError>>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<BackendResponse, BackendError>>) -> Self {
            Self {
                script: Mutex::new(script),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolDecl],
        ) -> Result<BackendResponse, BackendError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Ok(BackendResponse::ToolCalls(vec![tool_call(
                    "c-loop",
                    "detect_conflicts",
                    r#"{"implementation_date": "2026-09-01"}"#,
                )]));
            }
            script.remove(0)
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: id.to_string(),
            call_type: "function".to_string(),
            function: ToolCallFunction {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    fn orchestrator(backend: ScriptedBackend, max_rounds: u32) -> Orchestrator {
        Orchestrator::new(
            Arc::new(backend),
            Arc::new(default_registry()),
            max_rounds,
        )
    }

    #[tokio::test]
    async fn test_immediate_final_answer() {
        let backend = ScriptedBackend::new(vec![Ok(BackendResponse::Final(
            "Low risk. Score: 12/100".to_string(),
        ))]);
        let orch = orchestrator(backend, 10);
        let answer = orch.run("assess this").await.unwrap();
        assert_eq!(answer, "Low risk. Score: 12/100");
    }

    #[tokio::test]
    async fn test_tool_round_feeds_result_back() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(BackendResponse::ToolCalls(vec![tool_call(
                "c1",
                "check_configuration_items",
                r#"{"systems": "payments"}"#,
            )])),
            Ok(BackendResponse::Final("Total Score: 60/100".to_string())),
        ]));
        let orch = Orchestrator::new(
            Arc::clone(&backend) as Arc<dyn LlmBackend>,
            Arc::new(default_registry()),
            10,
        );

        let answer = orch.run("assess this").await.unwrap();
        assert_eq!(answer, "Total Score: 60/100");

        // History on the second call: system, user, assistant calls, tool result.
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let second = &seen[1];
        assert_eq!(second.len(), 4);
        assert_eq!(second[2].role, "assistant");
        assert_eq!(second[3].role, "tool");
        assert_eq!(second[3].tool_call_id.as_deref(), Some("c1"));
        assert!(second[3].content.as_ref().unwrap().contains("payments"));
    }

    #[tokio::test]
    async fn test_round_limit_exceeded() {
        // Empty script: the mock asks for tools forever.
        let backend = ScriptedBackend::new(vec![]);
        let orch = orchestrator(backend, 3);
        let err = orch.run("assess this").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::RoundLimitExceeded(3)));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let backend = ScriptedBackend::new(vec![Err(BackendError::Api {
            status: 503,
            message: "overloaded".to_string(),
        })]);
        let orch = orchestrator(backend, 10);
        let err = orch.run("assess this").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Backend(_)));
    }

    #[tokio::test]
    async fn test_malformed_arguments_still_attempted() {
        let backend = ScriptedBackend::new(vec![
            Ok(BackendResponse::ToolCalls(vec![tool_call(
                "c1",
                "check_configuration_items",
                "not json at all",
            )])),
            Ok(BackendResponse::Final("done".to_string())),
        ]);
        let seen_handle = Arc::new(backend);
        let orch = Orchestrator::new(
            Arc::clone(&seen_handle) as Arc<dyn LlmBackend>,
            Arc::new(default_registry()),
            10,
        );
        orch.run("assess this").await.unwrap();

        let seen = seen_handle.seen.lock().unwrap();
        // The raw text was passed through as the systems description.
        assert!(seen[1][3]
            .content
            .as_ref()
            .unwrap()
            .contains("not json at all"));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_failure_text() {
        let backend = ScriptedBackend::new(vec![
            Ok(BackendResponse::ToolCalls(vec![tool_call(
                "c1",
                "consult_oracle",
                "{}",
            )])),
            Ok(BackendResponse::Final("done".to_string())),
        ]);
        let seen_handle = Arc::new(backend);
        let orch = Orchestrator::new(
            Arc::clone(&seen_handle) as Arc<dyn LlmBackend>,
            Arc::new(default_registry()),
            10,
        );
        let answer = orch.run("assess this").await.unwrap();
        assert_eq!(answer, "done");

        let seen = seen_handle.seen.lock().unwrap();
        assert!(seen[1][3].content.as_ref().unwrap().contains("lookup failed"));
    }
}

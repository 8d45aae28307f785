//! The reasoning loop.
//!
//! One run sends the transcript plus the tool catalog to the model, executes
//! whatever tool calls come back (in order), appends their results, and asks
//! again, until the model answers without tool calls or the iteration cap is
//! hit. Runs are strictly sequential; nothing here is retried.

use std::sync::Arc;
use std::time::Instant;

use agromie_core::OperationOutcome;
use agromie_core::error::ProviderError;
use agromie_core::message::{Message, Role};
use agromie_core::provider::{Provider, ProviderRequest, ToolChoice, ToolDefinition};
use agromie_core::tool::ToolRegistry;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::prompt::SYSTEM_PROMPT;

/// Default cap on model round-trips per message.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

const NO_RESPONSE: &str = "Nenhuma resposta gerada";
const TRANSPORT_FAILED: &str = "Não consegui falar com o assistente agora. Tente novamente.";
const LOG_PREVIEW_CHARS: usize = 200;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// The model answered without requesting tools
    Completed,
    /// The iteration cap was reached while the model still wanted tools
    Capped,
    /// The model call failed
    TransportFailed,
}

/// The externally visible outcome of one `process_message` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorResult {
    pub success: bool,
    pub message: String,
    pub tool_call_count: usize,
    pub iteration_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_response_text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub state: RunState,
    /// Every message of the run, system prompt first.
    #[serde(skip)]
    pub transcript: Vec<Message>,
}

/// Drives the model through the tool catalog for one user message.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    max_iterations: usize,
    system_prompt: String,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.3,
            max_tokens: None,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the default iteration cap. Zero is treated as one.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Process a user message with the configured iteration cap.
    pub async fn process_message(&self, text: &str) -> OrchestratorResult {
        self.process_message_with_limit(text, self.max_iterations).await
    }

    /// Process a user message with an explicit iteration cap.
    pub async fn process_message_with_limit(
        &self,
        text: &str,
        max_iterations: usize,
    ) -> OrchestratorResult {
        let max_iterations = max_iterations.max(1);
        let definitions = self.tools.definitions();
        let started = Instant::now();

        let mut run = Run {
            transcript: vec![Message::system(&self.system_prompt), Message::user(text)],
            tool_calls: 0,
            iterations: 0,
            errors: Vec::new(),
        };

        info!(max_iterations, chars = text.len(), "Processing message");

        let state = loop {
            if run.iterations >= max_iterations {
                warn!(iterations = run.iterations, "Iteration cap reached");
                break RunState::Capped;
            }
            run.iterations += 1;
            debug!(iteration = run.iterations, messages = run.transcript.len(), "Loop iteration");

            let reply = match self.call_model(&run.transcript, &definitions).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(iteration = run.iterations, error = %e, "Model call failed");
                    run.errors.push(match e {
                        ProviderError::EmptyResponse => "Resposta vazia da LLM".to_string(),
                        other => format!("Erro na API: {other}"),
                    });
                    break RunState::TransportFailed;
                }
            };

            let calls = reply.tool_calls.clone();
            run.transcript.push(reply);

            if calls.is_empty() {
                break RunState::Completed;
            }

            debug!(count = calls.len(), "Executing tool calls");
            for call in &calls {
                let outcome = self.run_tool(&call.name, &call.arguments).await;
                run.tool_calls += 1;
                if !outcome.success {
                    run.errors.push(format!("{}: {}", call.name, outcome.failure_reason()));
                }
                run.transcript.push(Message::tool_result(
                    &call.id,
                    &call.name,
                    outcome.to_json_string(),
                ));
            }
        };

        let result = run.finish(state, max_iterations);
        info!(
            state = ?result.state,
            success = result.success,
            iterations = result.iteration_count,
            tool_calls = result.tool_call_count,
            errors = result.errors.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Message processed"
        );
        result
    }

    async fn call_model(
        &self,
        transcript: &[Message],
        definitions: &[ToolDefinition],
    ) -> Result<Message, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: transcript.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: definitions.to_vec(),
            tool_choice: ToolChoice::Auto,
        };
        let response = self.provider.complete(request).await?;
        let mut message = response.message;
        // Some backends answer with a different role tag; the transcript
        // records every reply as the assistant's.
        message.role = Role::Assistant;
        Ok(message)
    }

    /// Parse the raw argument payload and invoke the tool. Every failure,
    /// including unparsable JSON, comes back as a failed outcome.
    async fn run_tool(&self, name: &str, raw_arguments: &str) -> OperationOutcome {
        let started = Instant::now();
        let arguments = match parse_arguments(raw_arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(tool = name, arguments = %preview(raw_arguments), error = %e, "Malformed tool arguments");
                return OperationOutcome::fault(
                    format!("Argumentos inválidos para {name}"),
                    format!("Erro ao fazer parse dos argumentos: {e}"),
                );
            }
        };

        let outcome = self.tools.invoke(name, arguments).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        if outcome.success {
            info!(tool = name, duration_ms, result = %preview(&outcome.message), "Tool executed");
        } else {
            warn!(tool = name, duration_ms, reason = %preview(outcome.failure_reason()), "Tool failed");
        }
        outcome
    }
}

/// An empty payload means "no arguments".
fn parse_arguments(raw: &str) -> Result<serde_json::Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    serde_json::from_str(raw)
}

fn preview(text: &str) -> String {
    if text.chars().count() <= LOG_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
    format!("{cut}…")
}

struct Run {
    transcript: Vec<Message>,
    tool_calls: usize,
    iterations: usize,
    errors: Vec<String>,
}

impl Run {
    fn finish(self, state: RunState, max_iterations: usize) -> OrchestratorResult {
        let replies: Vec<&str> = self
            .transcript
            .iter()
            .filter(|m| m.role == Role::Assistant && !m.content.trim().is_empty())
            .map(|m| m.content.as_str())
            .collect();
        let final_response_text = (!replies.is_empty()).then(|| replies.join("\n\n"));

        let message = match state {
            RunState::Completed => final_response_text
                .clone()
                .unwrap_or_else(|| NO_RESPONSE.to_string()),
            RunState::Capped => format!(
                "Não consegui concluir a operação em {max_iterations} iterações. \
                 Algumas ações podem ter sido registradas parcialmente."
            ),
            RunState::TransportFailed => TRANSPORT_FAILED.to_string(),
        };

        OrchestratorResult {
            success: state == RunState::Completed,
            message,
            tool_call_count: self.tool_calls,
            iteration_count: self.iterations,
            final_response_text,
            errors: self.errors,
            state,
            transcript: self.transcript,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use agromie_core::error::ToolError;
    use agromie_core::tool::Tool;
    use async_trait::async_trait;
    use serde_json::json;

    /// Counts calls and echoes its `text` argument; fails on `fail: true`.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}, "required": []})
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<OperationOutcome, ToolError> {
            if arguments["fail"].as_bool() == Some(true) {
                return Ok(OperationOutcome::fail("Quantos animais?"));
            }
            Ok(OperationOutcome::ok(arguments["text"].as_str().unwrap_or("")))
        }
    }

    fn orchestrator(provider: Arc<dyn Provider>) -> Orchestrator {
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(EchoTool));
        Orchestrator::new(provider, "mock-model", Arc::new(tools))
    }

    #[tokio::test]
    async fn text_only_reply_completes_in_one_iteration() {
        let provider = Arc::new(ScriptedProvider::new(vec![text("Olá! Como posso ajudar?")]));
        let result = orchestrator(provider.clone()).process_message("oi").await;

        assert!(result.success);
        assert_eq!(result.state, RunState::Completed);
        assert_eq!(result.iteration_count, 1);
        assert_eq!(result.tool_call_count, 0);
        assert_eq!(result.message, "Olá! Como posso ajudar?");
        assert_eq!(result.transcript.len(), 3);
        assert_eq!(result.transcript[0].role, Role::System);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn request_carries_transcript_and_catalog() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_calls(vec![call("c1", "echo", json!({"text": "a"}))], ""),
            text("feito"),
        ]));
        orchestrator(provider.clone()).process_message("faça").await;

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].tool_choice, ToolChoice::Auto);
        assert_eq!(requests[0].messages.len(), 2);
        // system, user, assistant(tool call), tool result
        assert_eq!(requests[1].messages.len(), 4);
        let tool_msg = &requests[1].messages[3];
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("c1"));
        assert_eq!(tool_msg.tool_name.as_deref(), Some("echo"));
    }

    #[tokio::test]
    async fn tool_calls_run_in_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_calls(
                vec![
                    call("c1", "echo", json!({"text": "primeiro"})),
                    call("c2", "echo", json!({"text": "segundo"})),
                ],
                "Registrando.",
            ),
            text("Pronto."),
        ]));
        let result = orchestrator(provider).process_message("duas coisas").await;

        assert!(result.success);
        assert_eq!(result.tool_call_count, 2);
        assert_eq!(result.iteration_count, 2);
        let ids: Vec<_> = result
            .transcript
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(result.final_response_text.as_deref(), Some("Registrando.\n\nPronto."));
    }

    #[tokio::test]
    async fn cap_is_enforced_when_model_never_stops() {
        let provider = Arc::new(ScriptedProvider::repeating(tool_calls(
            vec![call("c", "echo", json!({"text": "de novo"}))],
            "",
        )));
        let result = orchestrator(provider.clone())
            .process_message_with_limit("loop", 3)
            .await;

        assert!(!result.success);
        assert_eq!(result.state, RunState::Capped);
        assert_eq!(result.iteration_count, 3);
        assert_eq!(result.tool_call_count, 3);
        assert_eq!(provider.calls(), 3);
        assert!(result.message.contains("3 iterações"));
    }

    #[tokio::test]
    async fn zero_cap_means_one_iteration() {
        let provider = Arc::new(ScriptedProvider::new(vec![text("ok")]));
        let result = orchestrator(provider).process_message_with_limit("oi", 0).await;
        assert!(result.success);
        assert_eq!(result.iteration_count, 1);
    }

    #[tokio::test]
    async fn malformed_arguments_do_not_end_the_run() {
        let mut bad = call("c1", "echo", json!({}));
        bad.arguments = "{quantidade: 50".into();
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_calls(vec![bad, call("c2", "echo", json!({"text": "ok"}))], ""),
            text("Corrigido."),
        ]));
        let result = orchestrator(provider).process_message("vendi").await;

        assert!(result.success);
        assert_eq!(result.tool_call_count, 2);
        let first: OperationOutcome =
            serde_json::from_str(&result.transcript[3].content).unwrap();
        assert!(!first.success);
        assert!(first.failure_reason().contains("parse"));
        let second: OperationOutcome =
            serde_json::from_str(&result.transcript[4].content).unwrap();
        assert!(second.success);
        assert_eq!(result.errors.len(), 1);
    }

    #[tokio::test]
    async fn recovered_tool_failure_still_succeeds() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_calls(vec![call("c1", "echo", json!({"fail": true}))], ""),
            text("Quantos animais você vendeu?"),
        ]));
        let result = orchestrator(provider).process_message("vendi bezerras").await;

        assert!(result.success);
        assert_eq!(result.errors, vec!["echo: Quantos animais?".to_string()]);
        assert_eq!(result.message, "Quantos animais você vendeu?");
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_to_the_model() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_calls(vec![call("c1", "readFile", json!({"path": "x"}))], ""),
            text("Não consegui."),
        ]));
        let result = orchestrator(provider).process_message("leia").await;

        assert!(result.success);
        assert_eq!(result.errors, vec!["readFile: Tool desconhecida: readFile".to_string()]);
    }

    #[tokio::test]
    async fn transport_failure_stops_the_loop() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_calls(vec![call("c1", "echo", json!({"text": "a"}))], "Vou registrar."),
            Err(ProviderError::ApiError {
                status_code: 500,
                message: "upstream".into(),
            }),
        ]));
        let result = orchestrator(provider.clone()).process_message("faça").await;

        assert!(!result.success);
        assert_eq!(result.state, RunState::TransportFailed);
        assert_eq!(result.iteration_count, 2);
        assert_eq!(result.tool_call_count, 1);
        assert_eq!(provider.calls(), 2);
        assert!(result.errors[0].starts_with("Erro na API:"));
        assert_eq!(result.message, TRANSPORT_FAILED);
        assert_eq!(result.final_response_text.as_deref(), Some("Vou registrar."));
    }

    #[tokio::test]
    async fn empty_response_is_named() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::EmptyResponse)]));
        let result = orchestrator(provider).process_message("oi").await;
        assert_eq!(result.errors, vec!["Resposta vazia da LLM".to_string()]);
        assert!(result.final_response_text.is_none());
    }

    #[tokio::test]
    async fn silent_completion_has_fallback_message() {
        let provider = Arc::new(ScriptedProvider::new(vec![text("")]));
        let result = orchestrator(provider).process_message("oi").await;
        assert!(result.success);
        assert_eq!(result.message, NO_RESPONSE);
        assert!(result.final_response_text.is_none());
        // The empty reply is still in the transcript.
        assert_eq!(result.transcript.len(), 3);
    }

    #[tokio::test]
    async fn custom_system_prompt_is_first() {
        let provider = Arc::new(ScriptedProvider::new(vec![text("ok")]));
        let result = orchestrator(provider)
            .with_system_prompt("Responda em uma linha.")
            .process_message("oi")
            .await;
        assert_eq!(result.transcript[0].content, "Responda em uma linha.");
    }

    #[test]
    fn previews_are_truncated() {
        let long = "a".repeat(500);
        assert_eq!(preview(&long).chars().count(), LOG_PREVIEW_CHARS + 1);
        assert_eq!(preview("curto"), "curto");
    }

    #[test]
    fn result_serializes_camel_case_without_transcript() {
        let run = Run {
            transcript: vec![Message::system("s"), Message::user("u"), Message::assistant("a")],
            tool_calls: 0,
            iterations: 1,
            errors: Vec::new(),
        };
        let json = serde_json::to_value(run.finish(RunState::Completed, 10)).unwrap();
        assert_eq!(json["toolCallCount"], 0);
        assert_eq!(json["iterationCount"], 1);
        assert_eq!(json["finalResponseText"], "a");
        assert_eq!(json["state"], "COMPLETED");
        assert!(json.get("transcript").is_none());
        assert!(json.get("errors").is_none());
    }
}

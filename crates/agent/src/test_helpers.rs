//! Scripted provider shared by the orchestrator tests.

use agromie_core::error::ProviderError;
use agromie_core::message::{Message, MessageToolCall};
use agromie_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

type Scripted = Result<ProviderResponse, ProviderError>;

/// A provider that plays back a script of replies in order.
///
/// Every request is recorded. Panics if called more often than scripted,
/// unless built with [`ScriptedProvider::repeating`].
pub struct ScriptedProvider {
    script: Mutex<Vec<Scripted>>,
    repeat: Option<Scripted>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that gives the same reply forever.
    pub fn repeating(reply: Scripted) -> Self {
        Self {
            repeat: Some(reply),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        if let Some(reply) = &self.repeat {
            return reply.clone();
        }

        let script = self.script.lock().unwrap();
        match script.get(call - 1) {
            Some(reply) => reply.clone(),
            None => panic!(
                "ScriptedProvider: no more replies (call #{call}, have {})",
                script.len()
            ),
        }
    }
}

fn response(message: Message) -> ProviderResponse {
    ProviderResponse {
        message,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A plain text reply.
pub fn text(content: &str) -> Scripted {
    Ok(response(Message::assistant(content)))
}

/// A reply requesting tool calls, with optional accompanying text.
pub fn tool_calls(calls: Vec<MessageToolCall>, content: &str) -> Scripted {
    let mut message = Message::assistant(content);
    message.tool_calls = calls;
    Ok(response(message))
}

pub fn call(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}

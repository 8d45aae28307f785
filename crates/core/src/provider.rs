//! Provider trait: the abstraction over LLM backends.
//!
//! A Provider knows how to send a transcript plus the tool catalog to a
//! language model and get one assistant message back. The orchestrator never
//! knows which backend it is talking to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::Message;

/// How the model may use the offered tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model decides whether to call tools
    #[default]
    Auto,
    /// Tools are offered but must not be called
    None,
}

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "google/gemini-2.0-flash-lite-001")
    pub model: String,

    /// The full transcript, resent on every iteration
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Tool choice mode
    #[serde(default)]
    pub tool_choice: ToolChoice,
}

fn default_temperature() -> f32 {
    0.3
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. Decorators such as a retrying
/// wrapper implement it too, so they stack transparently.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_request_defaults() {
        let req: ProviderRequest = serde_json::from_value(serde_json::json!({
            "model": "google/gemini-2.0-flash-lite-001",
            "messages": []
        }))
        .unwrap();
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(req.tool_choice, ToolChoice::Auto);
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "execute_intent".into(),
            description: "Run a farm operation".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "intent": { "type": "string" }
                },
                "required": ["intent"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("execute_intent"));
        assert!(json.contains("intent"));
    }
}

//! Tool trait: the abstraction over orchestrator capabilities.
//!
//! Tools are what give the model the ability to act on the farm records:
//! run a domain operation, read or write a collection, leave a log line.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::error::ToolError;
use crate::outcome::OperationOutcome;
use crate::provider::ToolDefinition;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The core Tool trait.
///
/// Each capability implements this trait and is registered in the
/// [`ToolRegistry`]. Arguments come straight from the model and must be
/// validated like any public input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "execute_intent").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<OperationOutcome, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The orchestrator uses this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Look up and execute tools when the LLM requests them
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions, sorted by name so requests are stable.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool call.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<OperationOutcome, ToolError> {
        let tool = self.tools.get(&call.name).ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        tool.execute(call.arguments.clone()).await
    }

    /// Invoke a tool by name, folding every error into a failed outcome.
    pub async fn invoke(&self, name: &str, arguments: serde_json::Value) -> OperationOutcome {
        let call = ToolCall {
            id: String::new(),
            name: name.to_string(),
            arguments,
        };
        match self.execute(&call).await {
            Ok(outcome) => outcome,
            Err(ToolError::NotFound(name)) => {
                let reason = format!("Tool desconhecida: {name}");
                OperationOutcome::fault(reason.clone(), reason)
            }
            Err(e) => OperationOutcome::fault(format!("Falha ao executar {name}"), e),
        }
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<OperationOutcome, ToolError> {
            let text = arguments["text"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidArguments("Missing 'text'".into()))?;
            Ok(OperationOutcome::ok(text))
        }
    }

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str { self.0 }
        fn description(&self) -> &str { "" }
        fn parameters_schema(&self) -> serde_json::Value { serde_json::json!({"type": "object"}) }
        async fn execute(&self, _arguments: serde_json::Value) -> std::result::Result<OperationOutcome, ToolError> {
            Ok(OperationOutcome::ok(self.0))
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registry_definitions_are_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(NamedTool("zeta")));
        registry.register(Box::new(EchoTool));
        registry.register(Box::new(NamedTool("alpha")));
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["alpha", "echo", "zeta"]);
        assert_eq!(registry.names(), vec!["alpha", "echo", "zeta"]);
    }

    #[tokio::test]
    async fn registry_execute_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let call = ToolCall {
            id: "call_1".into(),
            name: "echo".into(),
            arguments: serde_json::json!({"text": "hello world"}),
        };
        let result = registry.execute(&call).await.unwrap();
        assert!(result.success);
        assert_eq!(result.message, "hello world");
    }

    #[tokio::test]
    async fn registry_execute_missing_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall {
            id: "call_1".into(),
            name: "nonexistent".into(),
            arguments: serde_json::json!({}),
        };
        let err = registry.execute(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn invoke_unknown_tool_is_a_failed_outcome() {
        let registry = ToolRegistry::new();
        let outcome = registry.invoke("readFile", serde_json::json!({})).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Tool desconhecida: readFile"));
    }

    #[tokio::test]
    async fn invoke_folds_argument_errors() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let outcome = registry.invoke("echo", serde_json::json!({})).await;
        assert!(!outcome.success);
        assert!(outcome.failure_reason().contains("text"));
    }
}

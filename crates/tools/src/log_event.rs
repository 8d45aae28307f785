//! Log event tool: lets the model leave a line in the application log.

use agromie_core::OperationOutcome;
use agromie_core::error::ToolError;
use agromie_core::tool::Tool;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

pub struct LogEventTool;

#[async_trait]
impl Tool for LogEventTool {
    fn name(&self) -> &str {
        "log_event"
    }

    fn description(&self) -> &str {
        "Registra uma mensagem no log do sistema."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "Mensagem a registrar" },
                "level": {
                    "type": "string",
                    "enum": ["debug", "info", "warn", "error"],
                    "description": "Nível do log (padrão: info)"
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<OperationOutcome, ToolError> {
        let message = arguments["message"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'message' argument".into()))?;

        match arguments["level"].as_str().unwrap_or("info") {
            "debug" => debug!(target: "agromie::model", "{message}"),
            "warn" => warn!(target: "agromie::model", "{message}"),
            "error" => error!(target: "agromie::model", "{message}"),
            _ => info!(target: "agromie::model", "{message}"),
        }

        Ok(OperationOutcome::ok("Log registrado"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logs_and_succeeds() {
        let outcome = LogEventTool
            .execute(serde_json::json!({"message": "venda conferida", "level": "warn"}))
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.message, "Log registrado");
    }

    #[tokio::test]
    async fn message_is_required() {
        assert!(matches!(
            LogEventTool.execute(serde_json::json!({})).await,
            Err(ToolError::InvalidArguments(_))
        ));
    }
}

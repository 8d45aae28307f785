//! Dev server tool: always reports that the operation is unavailable.

use agromie_core::OperationOutcome;
use agromie_core::error::ToolError;
use agromie_core::tool::Tool;
use async_trait::async_trait;
use serde_json::Value;

pub struct DevServerTool;

#[async_trait]
impl Tool for DevServerTool {
    fn name(&self) -> &str {
        "dev_server"
    }

    fn description(&self) -> &str {
        "Operação no servidor de desenvolvimento (não disponível)."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Comando opcional"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, arguments: Value) -> Result<OperationOutcome, ToolError> {
        Ok(OperationOutcome::ok_with(
            "Operações de servidor de desenvolvimento não estão disponíveis.",
            serde_json::json!({ "command": arguments.get("command"), "available": false }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_unavailable() {
        let outcome = DevServerTool
            .execute(serde_json::json!({"command": "restart"}))
            .await
            .unwrap();
        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data["available"], false);
        assert_eq!(data["command"], "restart");
    }
}

//! Execute intent tool: forwards to the domain operation executor.

use agromie_core::OperationOutcome;
use agromie_core::error::ToolError;
use agromie_core::tool::Tool;
use agromie_domain::{OperationExecutor, OperationKind};
use async_trait::async_trait;
use serde_json::Value;

pub struct ExecuteIntentTool {
    executor: OperationExecutor,
}

impl ExecuteIntentTool {
    pub fn new(executor: OperationExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Tool for ExecuteIntentTool {
    fn name(&self) -> &str {
        "execute_intent"
    }

    fn description(&self) -> &str {
        "Executa uma operação da fazenda (lançamento financeiro, compra ou venda de animais, \
         nascimento, morte, pesagem, pastagens, consultas). Valores monetários em centavos, \
         datas em AAAA-MM-DD."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "intent": {
                    "type": "string",
                    "enum": OperationKind::names(),
                    "description": "Nome da operação"
                },
                "entities": {
                    "type": "object",
                    "description": "Argumentos da operação (quantidade, valor, categoria, data, ...)"
                }
            },
            "required": ["intent", "entities"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<OperationOutcome, ToolError> {
        let intent = arguments["intent"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'intent' argument".into()))?;

        let entities = match &arguments["entities"] {
            Value::Null => Value::Object(Default::default()),
            Value::Object(_) => arguments["entities"].clone(),
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "'entities' must be an object, got {other}"
                )));
            }
        };

        Ok(self.executor.execute(intent, &entities).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agromie_store::InMemoryStore;
    use std::sync::Arc;

    async fn tool() -> ExecuteIntentTool {
        let executor = OperationExecutor::new(Arc::new(InMemoryStore::new()));
        executor.ensure_seeded().await.unwrap();
        ExecuteIntentTool::new(executor)
    }

    #[tokio::test]
    async fn schema_lists_every_operation() {
        let tool = tool().await;
        let schema = tool.parameters_schema();
        let names = schema["properties"]["intent"]["enum"].as_array().unwrap();
        assert_eq!(names.len(), OperationKind::ALL.len());
        assert!(names.iter().any(|n| n == "operacao_complexa_rebanho"));
    }

    #[tokio::test]
    async fn forwards_to_executor() {
        let tool = tool().await;
        let outcome = tool
            .execute(serde_json::json!({
                "intent": "registrar_despesa",
                "entities": {"valor": 45_000, "descricao": "Vacinas"}
            }))
            .await
            .unwrap();
        assert!(outcome.success, "{outcome:?}");
    }

    #[tokio::test]
    async fn missing_entities_reach_validation() {
        let tool = tool().await;
        let outcome = tool
            .execute(serde_json::json!({"intent": "registrar_despesa"}))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("valor"));
    }

    #[tokio::test]
    async fn bad_argument_shapes_are_errors() {
        let tool = tool().await;
        assert!(matches!(
            tool.execute(serde_json::json!({})).await,
            Err(ToolError::InvalidArguments(_))
        ));
        assert!(matches!(
            tool.execute(serde_json::json!({"intent": "consultar_rebanho", "entities": [1]}))
                .await,
            Err(ToolError::InvalidArguments(_))
        ));
    }
}

//! Raw collection access: `query_storage` and `mutate_storage`.
//!
//! Only the domain's own collection keys are reachable.

use agromie_core::OperationOutcome;
use agromie_core::error::ToolError;
use agromie_core::store::KvStore;
use agromie_core::tool::Tool;
use agromie_domain::keys;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

fn key_schema() -> Value {
    serde_json::json!({
        "type": "string",
        "enum": keys::ALL,
        "description": "Chave da coleção"
    })
}

fn known_key<'a>(tool: &str, arguments: &'a Value) -> Result<Result<&'a str, OperationOutcome>, ToolError> {
    let key = arguments["key"]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("{tool}: missing 'key' argument")))?;
    if keys::is_known(key) {
        Ok(Ok(key))
    } else {
        Ok(Err(OperationOutcome::fail(format!(
            "Coleção desconhecida: {key}. Use uma de: {}",
            keys::ALL.join(", ")
        ))))
    }
}

fn storage_failure(tool: &str, e: impl std::fmt::Display) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool.into(),
        reason: e.to_string(),
    }
}

pub struct QueryStorageTool {
    store: Arc<dyn KvStore>,
}

impl QueryStorageTool {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for QueryStorageTool {
    fn name(&self) -> &str {
        "query_storage"
    }

    fn description(&self) -> &str {
        "Lê uma coleção de registros da fazenda (lista JSON)."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "key": key_schema() },
            "required": ["key"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<OperationOutcome, ToolError> {
        let key = match known_key(self.name(), &arguments)? {
            Ok(key) => key,
            Err(rejected) => return Ok(rejected),
        };
        let data = self
            .store
            .get(key)
            .await
            .map_err(|e| storage_failure(self.name(), e))?
            .unwrap_or(Value::Array(Vec::new()));
        Ok(OperationOutcome::ok_with(format!("Dados de {key} recuperados"), data))
    }
}

pub struct MutateStorageTool {
    store: Arc<dyn KvStore>,
}

impl MutateStorageTool {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for MutateStorageTool {
    fn name(&self) -> &str {
        "mutate_storage"
    }

    fn description(&self) -> &str {
        "Substitui uma coleção inteira de registros. Prefira execute_intent para operações da fazenda."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "key": key_schema(),
                "payload": {
                    "type": "array",
                    "items": { "type": "object" },
                    "description": "Nova lista completa de registros"
                }
            },
            "required": ["key", "payload"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<OperationOutcome, ToolError> {
        let key = match known_key(self.name(), &arguments)? {
            Ok(key) => key,
            Err(rejected) => return Ok(rejected),
        };
        let Some(items) = arguments["payload"].as_array() else {
            return Ok(OperationOutcome::fail("O payload precisa ser uma lista de registros."));
        };
        if !items.iter().all(Value::is_object) {
            return Ok(OperationOutcome::fail("Todos os itens do payload precisam ser objetos."));
        }

        let count = items.len();
        self.store
            .set(key, arguments["payload"].clone())
            .await
            .map_err(|e| storage_failure(self.name(), e))?;
        info!(collection = key, count, "Collection overwritten through mutate_storage");

        Ok(OperationOutcome::ok_with(
            format!("Dados de {key} atualizados"),
            serde_json::json!({ "key": key, "count": count }),
        ))
    }
}

//! List files tool: a static catalog of what the system holds.
//!
//! Nothing on disk is read. The listing names the record collections and the
//! domain modules so the model can orient itself before querying.

use agromie_core::OperationOutcome;
use agromie_core::error::ToolError;
use agromie_core::tool::Tool;
use agromie_domain::keys;
use async_trait::async_trait;
use serde_json::Value;

const MODULES: [&str; 5] = [
    "domain/finance",
    "domain/livestock",
    "domain/pasture",
    "domain/queries",
    "domain/reset",
];

fn catalog() -> Vec<String> {
    keys::ALL
        .iter()
        .map(|key| format!("storage/{key}"))
        .chain(MODULES.iter().map(|m| m.to_string()))
        .collect()
}

pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "Lista as coleções de dados (storage/...) e módulos (domain/...) do sistema."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Prefixo a filtrar, por exemplo 'storage' ou 'domain'"
                }
            },
            "required": ["directory"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<OperationOutcome, ToolError> {
        let directory = arguments["directory"]
            .as_str()
            .unwrap_or_default()
            .trim_matches('/');

        let entries: Vec<String> = catalog()
            .into_iter()
            .filter(|entry| entry.starts_with(directory))
            .collect();

        let location = if directory.is_empty() { "/" } else { directory };
        Ok(OperationOutcome::ok_with(
            format!("{} arquivos encontrados em {location}", entries.len()),
            serde_json::json!(entries),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filters_by_prefix() {
        let outcome = ListFilesTool
            .execute(serde_json::json!({"directory": "storage/"}))
            .await
            .unwrap();
        let entries = outcome.data.unwrap();
        assert_eq!(entries.as_array().unwrap().len(), keys::ALL.len());
        assert!(outcome.message.starts_with("8 arquivos"));
    }

    #[tokio::test]
    async fn empty_directory_lists_everything() {
        let outcome = ListFilesTool.execute(serde_json::json!({})).await.unwrap();
        assert_eq!(
            outcome.data.unwrap().as_array().unwrap().len(),
            keys::ALL.len() + MODULES.len()
        );
    }

    #[tokio::test]
    async fn unknown_prefix_is_empty_but_successful() {
        let outcome = ListFilesTool
            .execute(serde_json::json!({"directory": "src/pages"}))
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.data, Some(serde_json::json!([])));
    }
}

//! The tool catalog offered to the reasoning loop.
//!
//! Tools give the model the ability to act on the farm: run a domain
//! operation, read or overwrite a record collection, list what exists,
//! and leave a log line.

pub mod dev_server;
pub mod execute_intent;
pub mod list_files;
pub mod log_event;
pub mod storage;

use agromie_core::store::KvStore;
use agromie_core::tool::ToolRegistry;
use agromie_domain::OperationExecutor;
use std::sync::Arc;

/// Create the registry with every built-in tool.
///
/// `executor` and `store` should share the same backing store.
pub fn default_registry(executor: OperationExecutor, store: Arc<dyn KvStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(execute_intent::ExecuteIntentTool::new(executor)));
    registry.register(Box::new(storage::QueryStorageTool::new(store.clone())));
    registry.register(Box::new(storage::MutateStorageTool::new(store)));
    registry.register(Box::new(list_files::ListFilesTool));
    registry.register(Box::new(dev_server::DevServerTool));
    registry.register(Box::new(log_event::LogEventTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use agromie_store::InMemoryStore;

    fn registry() -> ToolRegistry {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryStore::new());
        default_registry(OperationExecutor::new(store.clone()), store)
    }

    #[test]
    fn registers_the_fixed_catalog() {
        assert_eq!(
            registry().names(),
            vec![
                "dev_server",
                "execute_intent",
                "list_files",
                "log_event",
                "mutate_storage",
                "query_storage"
            ]
        );
    }

    #[test]
    fn every_schema_is_an_object_with_required() {
        for def in registry().definitions() {
            assert_eq!(def.parameters["type"], "object", "{}", def.name);
            assert!(def.parameters["required"].is_array(), "{}", def.name);
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_a_failed_outcome() {
        let outcome = registry().invoke("readFile", serde_json::json!({})).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Tool desconhecida: readFile"));
    }
}

//! Wiring shared by the commands: config, store, executor, tool registry.

use std::sync::Arc;

use agromie_config::AppConfig;
use agromie_core::store::KvStore;
use agromie_core::tool::ToolRegistry;
use agromie_domain::OperationExecutor;
use agromie_store::{FileStore, InMemoryStore};
use tracing::{debug, info};

/// Everything a command needs to touch the farm records.
pub struct Runtime {
    pub config: AppConfig,
    pub store: Arc<dyn KvStore>,
    pub executor: OperationExecutor,
}

impl Runtime {
    /// Load and validate config, open the configured store, and seed the
    /// default catalogs.
    pub async fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
        config.validate()?;

        let store: Arc<dyn KvStore> = match config.store.backend.as_str() {
            "memory" => Arc::new(InMemoryStore::new()),
            _ => {
                let path = config.store.data_path();
                debug!(path = %path.display(), "Opening file store");
                Arc::new(FileStore::open(path)?)
            }
        };

        let executor = OperationExecutor::new(store.clone());
        executor.ensure_seeded().await?;
        info!(backend = %config.store.backend, "Farm records ready");

        Ok(Self {
            config,
            store,
            executor,
        })
    }

    pub fn registry(&self) -> ToolRegistry {
        agromie_tools::default_registry(self.executor.clone(), self.store.clone())
    }
}

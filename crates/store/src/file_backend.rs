//! File-based store: one JSON document holding every collection.
//!
//! The document is a JSON object mapping collection keys to their arrays.
//! It is loaded into memory on open and flushed to disk on every mutation
//! (set, remove, clear). A mutation only becomes visible to reads after its
//! flush succeeded.
//!
//! Storage location: `~/.agromie/data.json`

use agromie_core::error::StoreError;
use agromie_core::store::KvStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A file-backed store using a single pretty-printed JSON object.
pub struct FileStore {
    path: PathBuf,
    entries: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl FileStore {
    /// Open the store at the given path.
    ///
    /// A missing file starts empty (it is created on first write). A file
    /// that exists but is not a JSON object is refused rather than silently
    /// overwritten.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = Self::load_from_disk(&path)?;
        debug!(path = %path.display(), keys = entries.len(), "File store loaded");
        Ok(Self {
            path,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    /// Default path: `~/.agromie/data.json`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".agromie").join("data.json")
    }

    /// Where this store persists.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> Result<BTreeMap<String, Value>, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StoreError::Storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            key: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Write `entries` to disk via a temp file + rename.
    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Storage(format!("Failed to create data directory: {e}"))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Storage(format!("Failed to serialize store: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .map_err(|e| StoreError::Storage(format!("Failed to write store file: {e}")))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(StoreError::Storage(format!("Failed to replace store file: {e}")));
        }

        debug!(path = %self.path.display(), keys = entries.len(), "File store flushed");
        Ok(())
    }

    /// Apply `change` to a copy of the document and keep it only once it is on disk.
    ///
    /// On a failed write the in-memory document stays as it was, so reads never
    /// see data the file does not hold.
    async fn commit<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, Value>) -> bool,
    {
        let mut entries = self.entries.write().await;
        let mut candidate = entries.clone();
        if !change(&mut candidate) {
            return Ok(());
        }
        if let Err(e) = self.persist(&candidate) {
            warn!(path = %self.path.display(), error = %e, "File store write failed, keeping previous document");
            return Err(e);
        }
        *entries = candidate;
        Ok(())
    }
}

#[async_trait]
impl KvStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.commit(|entries| {
            entries.insert(key.to_string(), value);
            true
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.commit(|entries| entries.remove(key).is_some()).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.commit(|entries| {
            entries.clear();
            true
        })
        .await
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}

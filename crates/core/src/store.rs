//! Key-value store trait: where farm records live.
//!
//! Every collection (transactions, animals, pastures, ...) is one key whose
//! value is a JSON array of records. There is no partial-record update: a
//! write replaces the whole collection, so two concurrent writers to the same
//! key race with last-writer-wins semantics.

use async_trait::async_trait;
use crate::error::StoreError;

/// The core KvStore trait.
///
/// Implementations: in-memory (for testing), JSON file (default).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// The backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> std::result::Result<Option<serde_json::Value>, StoreError>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: serde_json::Value) -> std::result::Result<(), StoreError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> std::result::Result<(), StoreError>;

    /// Remove every key.
    async fn clear(&self) -> std::result::Result<(), StoreError>;

    /// All keys currently present, sorted.
    async fn keys(&self) -> std::result::Result<Vec<String>, StoreError>;
}

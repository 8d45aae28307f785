//! Typed access to record collections over a [`KvStore`].

use std::sync::Arc;

use agromie_core::error::StoreError;
use agromie_core::store::KvStore;
use serde_json::Value;
use tracing::debug;

use crate::records::Record;

/// Loads and saves whole collections of [`Record`]s.
///
/// Each save is a full read-modify-write of one key; callers that touch two
/// collections (a purchase writes the ledger and the herd) do so as two
/// independent writes.
#[derive(Clone)]
pub struct Records {
    store: Arc<dyn KvStore>,
}

impl Records {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Load every record of type `T`. A missing key is an empty collection.
    pub async fn load<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        match self.store.get(T::KEY).await? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
                key: T::KEY.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Replace the whole collection of type `T`.
    pub async fn save<T: Record>(&self, records: &[T]) -> Result<(), StoreError> {
        let value = serde_json::to_value(records)
            .map_err(|e| StoreError::Storage(format!("Failed to encode {}: {e}", T::KEY)))?;
        self.store.set(T::KEY, value).await?;
        debug!(collection = T::KEY, count = records.len(), "Collection written");
        Ok(())
    }

    /// Append one record to its collection.
    pub async fn append<T: Record>(&self, record: T) -> Result<(), StoreError> {
        let mut all = self.load::<T>().await?;
        all.push(record);
        self.save(&all).await
    }

    /// Drop the collection of type `T` entirely.
    pub async fn remove<T: Record>(&self) -> Result<(), StoreError> {
        self.store.remove(T::KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Account, AccountGroup};
    use agromie_store::InMemoryStore;

    fn account(name: &str) -> Account {
        Account {
            id: name.to_lowercase(),
            code: "1.1".into(),
            name: name.into(),
            group: AccountGroup::Revenues,
            active: true,
        }
    }

    #[tokio::test]
    async fn missing_collection_is_empty() {
        let records = Records::new(Arc::new(InMemoryStore::new()));
        assert!(records.load::<Account>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_then_load() {
        let records = Records::new(Arc::new(InMemoryStore::new()));
        records.append(account("Venda")).await.unwrap();
        records.append(account("Outras")).await.unwrap();

        let all = records.load::<Account>().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].name, "Outras");
    }

    #[tokio::test]
    async fn corrupt_collection_is_reported() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set("financial_accounts", serde_json::json!({"not": "an array"}))
            .await
            .unwrap();
        let records = Records::new(store);

        let err = records.load::<Account>().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "financial_accounts"));
    }
}

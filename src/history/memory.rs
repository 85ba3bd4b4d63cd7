use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{apply_save, AssignerRecord, HistoryStore, StoreError};

/// Keeps assigner records in memory; used by tests and the demo server
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    records: RwLock<HashMap<String, AssignerRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn create(&self, record: AssignerRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn load(&self, assigner_id: &str) -> Result<Option<AssignerRecord>, StoreError> {
        Ok(self.records.read().await.get(assigner_id).cloned())
    }

    async fn save(
        &self,
        assigner_id: &str,
        history: serde_json::Value,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(assigner_id)
            .ok_or_else(|| StoreError::NotFound(assigner_id.to_string()))?;
        apply_save(record, history, expected_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::AssignerKind;
    use serde_json::json;

    #[tokio::test]
    async fn create_load_save() {
        let store = InMemoryHistoryStore::new();
        let record = AssignerRecord::new("a1", "u1", "Jobs", AssignerKind::Rotation, vec!["Sweep".to_string()]);
        store.create(record.clone()).await.unwrap();
        assert!(matches!(
            store.create(record).await,
            Err(StoreError::AlreadyExists(_))
        ));

        let version = store.save("a1", json!({"k": 1}), 0).await.unwrap();
        assert_eq!(version, 1);
        let loaded = store.load("a1").await.unwrap().unwrap();
        assert_eq!(loaded.history, json!({"k": 1}));
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn save_unknown_assigner() {
        let store = InMemoryHistoryStore::new();
        assert!(matches!(
            store.save("missing", json!({}), 0).await,
            Err(StoreError::NotFound(_))
        ));
    }
}

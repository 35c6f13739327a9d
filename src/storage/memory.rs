//! An in-memory `PersistenceStore` for tests and ephemeral use.
use super::PersistenceStore;
use crate::record::LogRecord;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// A `PersistenceStore` keeping entries in a `HashMap`. Nothing
/// survives the process; useful wherever durability is not the point.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, across all prefixes.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an entry exists for `prefix` + `id`.
    pub fn contains(&self, prefix: &str, id: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .contains_key(&format!("{prefix}{id}"))
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn restore(&self, prefix: &str) -> Result<Vec<LogRecord>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter_map(|(key, payload)| {
                key.strip_prefix(prefix).map(|id| LogRecord {
                    id: id.to_string(),
                    payload: payload.clone(),
                })
            })
            .collect())
    }

    async fn persist(&self, prefix: &str, id: &str, payload: &Value) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(format!("{prefix}{id}"), payload.clone());
        Ok(())
    }

    async fn clear(&self, prefix: &str, id: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(&format!("{prefix}{id}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn restore_on_empty_store_yields_nothing() {
        let store = MemoryStore::new();
        assert!(store.restore("any/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn prefix_scopes_restore() {
        let store = MemoryStore::new();
        store.persist("a/", "1", &json!(1)).await.unwrap();
        store.persist("b/", "2", &json!(2)).await.unwrap();

        let restored = store.restore("a/").await.unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].id, "1");
        assert!(store.contains("b/", "2"));
    }
}

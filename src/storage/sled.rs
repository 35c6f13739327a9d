//! A `PersistenceStore` implementation backed by a `sled` tree.
use super::PersistenceStore;
use crate::record::LogRecord;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sled::Db;

/// Stores pending records in a dedicated tree of a `sled` database,
/// keyed by storage prefix plus record id, with JSON-encoded payloads.
pub struct SledStore {
    tree: sled::Tree,
}

impl SledStore {
    /// Creates a new `SledStore` on top of `db`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the `pending_logs` tree
    /// cannot be opened.
    pub fn new(db: Db) -> Result<Self> {
        let tree = db.open_tree("pending_logs")?;
        Ok(Self { tree })
    }
}

#[async_trait]
impl PersistenceStore for SledStore {
    async fn restore(&self, prefix: &str) -> Result<Vec<LogRecord>> {
        let mut records = Vec::new();

        for result in self.tree.scan_prefix(prefix.as_bytes()) {
            let (key, value) = result?;
            let key = std::str::from_utf8(&key)?;
            records.push(LogRecord {
                id: key[prefix.len()..].to_string(),
                payload: serde_json::from_slice(&value)?,
            });
        }

        Ok(records)
    }

    async fn persist(&self, prefix: &str, id: &str, payload: &Value) -> Result<()> {
        let key = format!("{prefix}{id}");
        let value = serde_json::to_vec(payload)?;

        self.tree.insert(key.as_bytes(), value)?;
        self.tree.flush_async().await?;
        Ok(())
    }

    async fn clear(&self, prefix: &str, id: &str) -> Result<()> {
        let key = format!("{prefix}{id}");
        self.tree.remove(key.as_bytes())?;
        self.tree.flush_async().await?;
        Ok(())
    }
}

//! Durable mirroring of unsent records.
//!
//! Implementations provide three primitives over a key/value namespace:
//! restore everything under a prefix, persist one entry, clear one
//! entry. The aggregator persists each record before it can be flushed
//! and clears it only after confirmed delivery, so the entries found at
//! startup are exactly the records whose delivery was never confirmed.
pub mod memory;
pub mod sled;

pub use self::memory::MemoryStore;
pub use self::sled::SledStore;

use crate::record::LogRecord;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A durable key/value backend for unsent records.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Materializes every entry stored under `prefix`, in unspecified
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or an entry fails
    /// to deserialize.
    async fn restore(&self, prefix: &str) -> Result<Vec<LogRecord>>;

    /// Durably stores `payload` keyed by `prefix` + `id`, overwriting
    /// any existing entry with the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be completed.
    async fn persist(&self, prefix: &str, id: &str, payload: &Value) -> Result<()>;

    /// Removes the entry keyed by `prefix` + `id`; no-op if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be completed.
    async fn clear(&self, prefix: &str, id: &str) -> Result<()>;
}

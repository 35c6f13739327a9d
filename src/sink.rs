//! Batch delivery.
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A trait for delivering flushed batches to their destination.
///
/// The aggregator never retries: a batch is handed over exactly once,
/// and a failed delivery is absorbed (logged, records dropped, persisted
/// entries left in place). A sink wanting stronger guarantees implements
/// its own retry behind this seam.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Delivers one batch of record payloads, in insertion order.
    ///
    /// `Ok(())` means the whole batch was delivered; the aggregator then
    /// clears the corresponding persisted entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be delivered. The error
    /// is absorbed by the pipeline; the batch is not re-queued.
    async fn deliver(&self, batch: Vec<Value>) -> Result<()>;
}

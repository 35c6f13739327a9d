//! The aggregator core: filtering, buffering, flush triggers and
//! dispatch.
use crate::config::{Config, ConfigError};
use crate::level::{Level, Mode, Source};
use crate::record::{build_record, Context, LogRecord};
use crate::scheduler::FlushScheduler;
use crate::sink::DeliverySink;
use crate::storage::PersistenceStore;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Builder for a [`Logger`].
///
/// Collects and validates the full configuration up front; `build`
/// performs the cross-field checks, starts the dispatch worker and, when
/// persistence is enabled, schedules the restore of previously unsent
/// records.
#[derive(Default)]
pub struct LoggerBuilder {
    config: Config,
    scheduler: Option<Arc<FlushScheduler>>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum severity; records below it are discarded silently.
    pub fn level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    /// Number of buffered records that triggers an immediate flush.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroBatchSize` for a size of 0.
    pub fn batch_size(mut self, size: usize) -> Result<Self, ConfigError> {
        self.config.set_batch_size(size)?;
        Ok(self)
    }

    /// Idle timeout after which the whole buffer is flushed. Zero
    /// disables the timeout trigger.
    pub fn batch_timeout(mut self, timeout: Duration) -> Self {
        self.config.batch_timeout = timeout;
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.config.source = source;
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Mirrors unsent records to the configured store. Requires a store
    /// at build time.
    pub fn persistence(mut self, persistence: bool) -> Self {
        self.config.persistence = persistence;
        self
    }

    /// Key prefix scoping this aggregator's entries within the store.
    pub fn storage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.storage_prefix = prefix.into();
        self
    }

    pub fn store(mut self, store: Arc<dyn PersistenceStore>) -> Self {
        self.config.store = Some(store);
        self
    }

    /// Injects a flush scheduler; defaults to the process-wide shared
    /// one, meaning all aggregators compete for a single timer slot.
    pub fn scheduler(mut self, scheduler: Arc<FlushScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Replaces the default payload shape (context merged with contents)
    /// with the callback's output.
    pub fn on_format<F>(mut self, format: F) -> Self
    where
        F: Fn(&Context, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.config.format = Some(Arc::new(format));
        self
    }

    /// The delivery sink invoked with each flushed batch. Server mode
    /// without a sink silently drops batches.
    pub fn on_send(mut self, sink: Arc<dyn DeliverySink>) -> Self {
        self.config.sink = Some(sink);
        self
    }

    /// Finalizes the configuration and starts the aggregator.
    ///
    /// Must be called inside a tokio runtime: the dispatch worker and
    /// the deferred restore task are spawned here. Restore feeds every
    /// previously unsent record back through the normal write path, so
    /// restored records are subject to the usual flush triggers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingStore` if persistence is enabled
    /// without a store.
    pub fn build(self) -> Result<Logger, ConfigError> {
        self.config.validate()?;

        let config = Arc::new(Mutex::new(self.config));
        let scheduler = self.scheduler.unwrap_or_else(FlushScheduler::shared);
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_dispatcher(Arc::clone(&config), dispatch_rx));

        let logger = Logger {
            config,
            buffer: Arc::new(Mutex::new(VecDeque::new())),
            scheduler,
            dispatch_tx,
        };

        let persistence = logger.config.lock().unwrap().persistence;
        if persistence {
            tokio::spawn(logger.clone().restore_from_store());
        }

        Ok(logger)
    }
}

/// A client-side log aggregator.
///
/// Emitted records pass a severity filter, are buffered in insertion
/// order (and mirrored to the persistence store when enabled), and are
/// flushed to the delivery sink when the buffer reaches the batch size
/// or the batch timeout elapses. Cloning is cheap and clones share all
/// state.
#[derive(Clone)]
pub struct Logger {
    config: Arc<Mutex<Config>>,
    buffer: Arc<Mutex<VecDeque<LogRecord>>>,
    scheduler: Arc<FlushScheduler>,
    dispatch_tx: mpsc::UnboundedSender<Vec<LogRecord>>,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Emits `contents` at `level`.
    ///
    /// Below the configured minimum this is a silent no-op. Console mode
    /// prints the shaped payload and never buffers; Server mode hands
    /// the record to the batching pipeline. Never returns an error:
    /// delivery and persistence faults are absorbed and logged, so an
    /// instrumentation call cannot crash the host application.
    pub async fn log(&self, level: Level, contents: Vec<Value>) {
        let (min_level, mode, source, version, format) = {
            let config = self.config.lock().unwrap();
            (
                config.level,
                config.mode,
                config.source,
                config.version.clone(),
                config.format.clone(),
            )
        };

        if level.rank() < min_level.rank() {
            return;
        }

        let record = build_record(level, contents, source, &version, format.as_deref());

        match mode {
            Mode::Console => println!("{}", record.payload),
            Mode::Server => self.write_log(record).await,
        }
    }

    pub async fn debug(&self, contents: Vec<Value>) {
        self.log(Level::Debug, contents).await;
    }

    pub async fn info(&self, contents: Vec<Value>) {
        self.log(Level::Info, contents).await;
    }

    pub async fn notice(&self, contents: Vec<Value>) {
        self.log(Level::Notice, contents).await;
    }

    pub async fn warning(&self, contents: Vec<Value>) {
        self.log(Level::Warning, contents).await;
    }

    pub async fn error(&self, contents: Vec<Value>) {
        self.log(Level::Error, contents).await;
    }

    pub async fn critical(&self, contents: Vec<Value>) {
        self.log(Level::Critical, contents).await;
    }

    pub async fn alert(&self, contents: Vec<Value>) {
        self.log(Level::Alert, contents).await;
    }

    pub async fn emergency(&self, contents: Vec<Value>) {
        self.log(Level::Emergency, contents).await;
    }

    /// Runs a record through the buffer and the two flush triggers.
    async fn write_log(&self, record: LogRecord) {
        let (batch_size, batch_timeout, persistence, prefix, store) = {
            let config = self.config.lock().unwrap();
            (
                config.batch_size,
                config.batch_timeout,
                config.persistence,
                config.storage_prefix.clone(),
                config.store.clone(),
            )
        };

        // Mirror before the record becomes visible to any flush, so a
        // dispatched record is always clearable by id. Persistence is
        // best-effort: a failed write keeps the in-memory pipeline going.
        if persistence {
            if let Some(store) = &store {
                if let Err(e) = store.persist(&prefix, &record.id, &record.payload).await {
                    warn!("Failed to persist record {}: {:#}", record.id, e);
                }
            }
        }

        let size_triggered = {
            let mut buffer = self.buffer.lock().unwrap();
            buffer.push_back(record);
            buffer.len() >= batch_size
        };

        // Size trigger: exactly one batch of the oldest records per
        // write call, even if a burst pushed the buffer far beyond the
        // threshold.
        if size_triggered {
            let batch: Vec<LogRecord> = {
                let mut buffer = self.buffer.lock().unwrap();
                let take = batch_size.min(buffer.len());
                buffer.drain(..take).collect()
            };
            self.send(batch);
        }

        // Timeout trigger: arm the (shared) timer slot if it is free and
        // something is left to flush. On firing the whole buffer drains,
        // not just one batch.
        if !batch_timeout.is_zero() && !self.buffer.lock().unwrap().is_empty() {
            let buffer = Arc::clone(&self.buffer);
            let dispatch_tx = self.dispatch_tx.clone();
            self.scheduler.try_schedule(batch_timeout, async move {
                let batch: Vec<LogRecord> = buffer.lock().unwrap().drain(..).collect();
                if !batch.is_empty() {
                    let _ = dispatch_tx.send(batch);
                }
            });
        }
    }

    /// Hands a batch to the dispatch worker; empty batches are no-ops.
    fn send(&self, batch: Vec<LogRecord>) {
        if batch.is_empty() {
            return;
        }
        let _ = self.dispatch_tx.send(batch);
    }

    /// Feeds previously unsent records back into the pipeline.
    async fn restore_from_store(self) {
        let (prefix, store) = {
            let config = self.config.lock().unwrap();
            (config.storage_prefix.clone(), config.store.clone())
        };
        let Some(store) = store else { return };

        match store.restore(&prefix).await {
            Ok(records) => {
                for record in records {
                    self.write_log(record).await;
                }
            }
            Err(e) => warn!("Failed to restore pending records: {:#}", e),
        }
    }

    // Typed accessors and validated update methods. Updates leave the
    // prior value untouched on invalid input and allow `?`-chaining.

    pub fn level(&self) -> Level {
        self.config.lock().unwrap().level
    }

    pub fn set_level(&self, level: Level) -> &Self {
        self.config.lock().unwrap().level = level;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.config.lock().unwrap().batch_size
    }

    /// # Errors
    ///
    /// Returns `ConfigError::ZeroBatchSize` for a size of 0.
    pub fn set_batch_size(&self, size: usize) -> Result<&Self, ConfigError> {
        self.config.lock().unwrap().set_batch_size(size)?;
        Ok(self)
    }

    pub fn batch_timeout(&self) -> Duration {
        self.config.lock().unwrap().batch_timeout
    }

    pub fn set_batch_timeout(&self, timeout: Duration) -> &Self {
        self.config.lock().unwrap().batch_timeout = timeout;
        self
    }

    pub fn source(&self) -> Source {
        self.config.lock().unwrap().source
    }

    pub fn set_source(&self, source: Source) -> &Self {
        self.config.lock().unwrap().source = source;
        self
    }

    pub fn version(&self) -> String {
        self.config.lock().unwrap().version.clone()
    }

    pub fn set_version(&self, version: impl Into<String>) -> &Self {
        self.config.lock().unwrap().version = version.into();
        self
    }

    pub fn mode(&self) -> Mode {
        self.config.lock().unwrap().mode
    }

    pub fn set_mode(&self, mode: Mode) -> &Self {
        self.config.lock().unwrap().mode = mode;
        self
    }

    pub fn persistence(&self) -> bool {
        self.config.lock().unwrap().persistence
    }

    /// # Errors
    ///
    /// Returns `ConfigError::MissingStore` when enabling persistence
    /// without a configured store.
    pub fn set_persistence(&self, persistence: bool) -> Result<&Self, ConfigError> {
        let mut config = self.config.lock().unwrap();
        if persistence && config.store.is_none() {
            return Err(ConfigError::MissingStore);
        }
        config.persistence = persistence;
        Ok(self)
    }

    pub fn storage_prefix(&self) -> String {
        self.config.lock().unwrap().storage_prefix.clone()
    }

    pub fn set_storage_prefix(&self, prefix: impl Into<String>) -> &Self {
        self.config.lock().unwrap().storage_prefix = prefix.into();
        self
    }

    pub fn set_store(&self, store: Arc<dyn PersistenceStore>) -> &Self {
        self.config.lock().unwrap().store = Some(store);
        self
    }

    pub fn set_format<F>(&self, format: F) -> &Self
    where
        F: Fn(&Context, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.config.lock().unwrap().format = Some(Arc::new(format));
        self
    }

    pub fn set_sink(&self, sink: Arc<dyn DeliverySink>) -> &Self {
        self.config.lock().unwrap().sink = Some(sink);
        self
    }

    /// Number of records currently buffered and not yet flushed.
    pub fn buffered(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }
}

/// Dispatch worker: consumes flushed batches in order, invokes the sink
/// and clears persisted entries on confirmed delivery. A single consumer
/// serializes deliveries, so batches reach the sink in flush order.
async fn run_dispatcher(
    config: Arc<Mutex<Config>>,
    mut dispatch_rx: mpsc::UnboundedReceiver<Vec<LogRecord>>,
) {
    while let Some(batch) = dispatch_rx.recv().await {
        if batch.is_empty() {
            continue;
        }

        let (sink, persistence, prefix, store) = {
            let config = config.lock().unwrap();
            (
                config.sink.clone(),
                config.persistence,
                config.storage_prefix.clone(),
                config.store.clone(),
            )
        };

        let Some(sink) = sink else {
            debug!("No delivery sink configured, dropping {} records", batch.len());
            continue;
        };

        let payloads: Vec<Value> = batch.iter().map(|record| record.payload.clone()).collect();

        match sink.deliver(payloads).await {
            Ok(()) => {
                if persistence {
                    if let Some(store) = &store {
                        for record in &batch {
                            if let Err(e) = store.clear(&prefix, &record.id).await {
                                warn!("Failed to clear delivered record {}: {:#}", record.id, e);
                            }
                        }
                    }
                }
            }
            // No retry, no re-queue: persisted entries stay in place and
            // come back on the next restore.
            Err(e) => warn!("Delivery failed, dropping {} records: {:#}", batch.len(), e),
        }
    }
}

//! Client-side log aggregator.
//!
//! Callers emit discrete log events; the aggregator filters them by
//! severity, buffers them in insertion order, optionally mirrors unsent
//! records to durable local storage so they survive a restart, and
//! flushes batches to a pluggable delivery sink when the buffer reaches
//! the batch size or the batch timeout elapses.
//!
//! ```no_run
//! use logship::{DeliverySink, Level, Logger, MemoryStore, Mode};
//! use std::sync::Arc;
//!
//! # struct HttpSink;
//! # #[async_trait::async_trait]
//! # impl DeliverySink for HttpSink {
//! #     async fn deliver(&self, _batch: Vec<serde_json::Value>) -> anyhow::Result<()> { Ok(()) }
//! # }
//! # async fn demo() -> Result<(), logship::ConfigError> {
//! let logger = Logger::builder()
//!     .mode(Mode::Server)
//!     .level(Level::Info)
//!     .batch_size(20)?
//!     .version("1.4.2")
//!     .persistence(true)
//!     .store(Arc::new(MemoryStore::new()))
//!     .storage_prefix("myapp/")
//!     .on_send(Arc::new(HttpSink))
//!     .build()?;
//!
//! logger.info(vec!["user signed in".into()]).await;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod level;
pub mod logger;
pub mod record;
pub mod scheduler;
pub mod sink;
pub mod storage;

pub use config::ConfigError;
pub use level::{Level, Mode, ParseEnumError, Source};
pub use logger::{Logger, LoggerBuilder};
pub use record::{Context, LogRecord};
pub use scheduler::FlushScheduler;
pub use sink::DeliverySink;
pub use storage::{MemoryStore, PersistenceStore, SledStore};

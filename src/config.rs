//! Validated aggregator configuration.
//!
//! Most constraints on the setting surface are carried by the type
//! system (levels, sources and modes are closed enums, timeouts are
//! unsigned). What remains is validated here: a batch size of zero and
//! persistence without a store are rejected before any state changes.
use crate::level::{Level, Mode, Source};
use crate::record::FormatFn;
use crate::sink::DeliverySink;
use crate::storage::PersistenceStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Rejected configuration input. The prior value is always retained.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("batch size must be greater than 0")]
    ZeroBatchSize,
    #[error("persistence is enabled but no store is configured")]
    MissingStore,
}

/// Mutable settings of one aggregator instance.
pub(crate) struct Config {
    pub level: Level,
    pub batch_size: usize,
    /// Zero disables the timeout trigger entirely.
    pub batch_timeout: Duration,
    pub source: Source,
    pub version: String,
    pub mode: Mode,
    pub persistence: bool,
    pub storage_prefix: String,
    pub store: Option<Arc<dyn PersistenceStore>>,
    pub format: Option<Arc<FormatFn>>,
    pub sink: Option<Arc<dyn DeliverySink>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Level::Info,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
            source: Source::Web,
            version: String::new(),
            mode: Mode::Console,
            persistence: false,
            storage_prefix: String::new(),
            store: None,
            format: None,
            sink: None,
        }
    }
}

impl Config {
    pub fn set_batch_size(&mut self, size: usize) -> Result<(), ConfigError> {
        if size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        self.batch_size = size;
        Ok(())
    }

    /// Cross-field check run at build time: persistence needs a store to
    /// restore from and persist into.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.persistence && self.store.is_none() {
            return Err(ConfigError::MissingStore);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_batch_size_is_rejected_and_prior_value_kept() {
        let mut config = Config::default();
        config.set_batch_size(3).unwrap();
        assert!(matches!(
            config.set_batch_size(0),
            Err(ConfigError::ZeroBatchSize)
        ));
        assert_eq!(config.batch_size, 3);
    }

    #[test]
    fn persistence_without_store_fails_validation() {
        let mut config = Config::default();
        config.persistence = true;
        assert!(matches!(config.validate(), Err(ConfigError::MissingStore)));

        config.persistence = false;
        assert!(config.validate().is_ok());
    }
}

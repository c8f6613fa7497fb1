//! Engine configuration.
//!
//! Every field has a default, so an empty file (or no file) yields a working
//! engine. Loaded from TOML:
//!
//! ```toml
//! storage_key = "orders"
//! packing_duration_ms = 90000
//! sweep_interval_ms = 1000
//!
//! [status_table.ready]
//! label = "Packing"
//! min = 75
//! max = 95
//! ```

use crate::progress::StatusTable;
use serde::{Deserialize, Serialize};
use snapshot_actor::ActorConfig;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_STORAGE_KEY: &str = "orders";
pub const DEFAULT_PACKING_DURATION_MS: u64 = 90_000;
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_BUFFER_SIZE: usize = 32;
pub const DEFAULT_ROUTE_TIMEOUT_MS: u64 = 1_500;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Store key holding the order snapshot.
    pub storage_key: String,
    /// Length of the packing window opened when an order becomes ready.
    pub packing_duration_ms: u64,
    /// Period of the packing sweep. `0` disables the interval.
    pub sweep_interval_ms: u64,
    /// Request channel capacity of each order actor.
    pub buffer_size: usize,
    /// Upper bound on the routing lookup made at creation.
    pub route_timeout_ms: u64,
    pub status_table: StatusTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            packing_duration_ms: DEFAULT_PACKING_DURATION_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            route_timeout_ms: DEFAULT_ROUTE_TIMEOUT_MS,
            status_table: StatusTable::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage_key must not be empty".to_string()));
        }
        if self.packing_duration_ms == 0 {
            return Err(ConfigError::Invalid("packing_duration_ms must be positive".to_string()));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be positive".to_string()));
        }
        self.status_table.validate()
    }

    pub fn packing_duration(&self) -> Duration {
        Duration::from_millis(self.packing_duration_ms)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_ms > 0).then(|| Duration::from_millis(self.sweep_interval_ms))
    }

    pub fn route_timeout(&self) -> Duration {
        Duration::from_millis(self.route_timeout_ms)
    }

    pub fn actor_config(&self) -> ActorConfig {
        ActorConfig {
            buffer_size: self.buffer_size,
            tick_interval: self.sweep_interval(),
        }
    }
}

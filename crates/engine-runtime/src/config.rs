//! # Engine Configuration
//!
//! Unified configuration for the engine and the runtime around it.
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`EngineConfig::load`)
//! 3. `TL_*` environment variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `TL_MIN_RETRY_DELAY` | `retry.min_delay_secs` |
//! | `TL_MAX_RETRY_DELAY` | `retry.max_delay_secs` |
//! | `TL_MARKER_TTL` | `retry.marker_ttl_secs` |
//! | `TL_BUS_CAPACITY` | `bus_capacity` |
//! | `TL_SNAPSHOT_PATH` | `snapshot_path` |
//! | `TL_SWEEP_INTERVAL` | `sweep_interval_secs` |
//! | `TL_FETCH_BATCH` | `fetch_batch` |

use board_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use shared_types::ValidationLimits;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tl_01_message_lists::MessageListConfig;
use tl_03_fetch_retry::RetryConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid environment variable {name}={value}")]
    Env { name: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub retry: RetryConfig,
    pub validation: ValidationLimits,
    pub lists: MessageListConfig,
    pub telemetry: TelemetryConfig,
    /// Events buffered per bus subscriber before it lags.
    pub bus_capacity: usize,
    /// Where snapshots are written; `None` keeps everything in memory.
    pub snapshot_path: Option<PathBuf>,
    /// Period of the marker sweep and fetch pass.
    pub sweep_interval_secs: u64,
    /// Messages requested from the content store per pass.
    pub fetch_batch: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            validation: ValidationLimits::default(),
            lists: MessageListConfig::default(),
            telemetry: TelemetryConfig::default(),
            bus_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
            snapshot_path: None,
            sweep_interval_secs: 60,
            fetch_batch: 64,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self {
            telemetry: TelemetryConfig::from_env(),
            ..Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path` (if given), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TL_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&'static str) -> Option<String>) -> Result<(), ConfigError> {
        fn number<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
            value.trim().parse().map_err(|_| ConfigError::Env { name, value })
        }

        if let Some(v) = lookup("TL_MIN_RETRY_DELAY") {
            self.retry.min_delay_secs = number("TL_MIN_RETRY_DELAY", v)?;
        }
        if let Some(v) = lookup("TL_MAX_RETRY_DELAY") {
            self.retry.max_delay_secs = number("TL_MAX_RETRY_DELAY", v)?;
        }
        if let Some(v) = lookup("TL_MARKER_TTL") {
            self.retry.marker_ttl_secs = number("TL_MARKER_TTL", v)?;
        }
        if let Some(v) = lookup("TL_BUS_CAPACITY") {
            self.bus_capacity = number("TL_BUS_CAPACITY", v)?;
        }
        if let Some(v) = lookup("TL_SWEEP_INTERVAL") {
            self.sweep_interval_secs = number("TL_SWEEP_INTERVAL", v)?;
        }
        if let Some(v) = lookup("TL_FETCH_BATCH") {
            self.fetch_batch = number("TL_FETCH_BATCH", v)?;
        }
        if let Some(v) = lookup("TL_SNAPSHOT_PATH") {
            self.snapshot_path = (!v.is_empty()).then(|| PathBuf::from(v));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.retry.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "retry delays must satisfy 0 < min ({}) <= max ({}) <= ttl ({})",
                self.retry.min_delay_secs, self.retry.max_delay_secs, self.retry.marker_ttl_secs
            )));
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::Invalid("bus_capacity must be positive".into()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("sweep_interval_secs must be positive".into()));
        }
        if self.validation.max_boards == 0 {
            return Err(ConfigError::Invalid("validation.max_boards must be positive".into()));
        }
        Ok(())
    }
}

//! # Board Telemetry
//!
//! Logging and metrics for the board engine.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use board_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TL_SERVICE_NAME` | `threadloom` | Service name in logs |
//! | `TL_LOG_LEVEL` | `info` | Log level filter |
//! | `TL_JSON_LOGS` | `false` | JSON log output |
//! | `TL_METRICS` | `true` | Register Prometheus metrics |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, BOARDS_TRACKED, DUPLICATES_IGNORED,
    EVENT_BUS_LAGGED, FETCH_FAILURES, FETCH_MARKERS, GHOSTS_CREATED, GHOSTS_RESOLVED,
    IDENTITY_DELETIONS, INCONSISTENT_REFERENCES, INGEST_DURATION, MESSAGES_INGESTED,
    ORPHANS_ADOPTED, VALIDATION_REJECTIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and, if enabled, metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if config.metrics_enabled {
        register_metrics()?;
    }
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for adding to a counter.
#[macro_export]
macro_rules! metric_add {
    ($metric:expr, $value:expr) => {
        $metric.inc_by($value as f64)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_macros() {
        metric_inc!(ORPHANS_ADOPTED);
        metric_add!(GHOSTS_RESOLVED, 2usize);
        metric_inc!(VALIDATION_REJECTIONS, &["message"]);
        assert!(GHOSTS_RESOLVED.get() >= 2.0);
    }
}

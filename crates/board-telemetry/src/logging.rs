//! Structured logging setup.
//!
//! Every log line carries the service name plus whatever structured fields
//! the call site adds. Board operations use `board`, `message_id` and
//! `author` consistently so logs can be grepped per board or per identity.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global tracing subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    match (config.console_output, config.json_logs) {
        (true, true) => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init()
                .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
        }
        (true, false) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
        }
        (false, _) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .try_init()
                .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
        }
    }

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Log an event with the emitting component attached.
#[macro_export]
macro_rules! log_event {
    ($level:ident, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a board-scoped message event with standard fields.
#[macro_export]
macro_rules! log_board_event {
    ($level:ident, $msg:expr, $board:expr, $message_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            board = %$board,
            message_id = %$message_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log an identity-scoped event with standard fields.
#[macro_export]
macro_rules! log_identity_event {
    ($level:ident, $msg:expr, $identity:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            author = %$identity,
            $($($field)*,)?
            $msg
        )
    };
}

//! # Threadloom Daemon
//!
//! Runs the board engine against an in-process content store until Ctrl+C.
//!
//! ```text
//! threadloom [config.toml]
//! ```
//!
//! The configuration file is optional; `TL_*` environment variables
//! override it. State is restored from and saved to `snapshot_path`.

use anyhow::{Context, Result};
use board_telemetry::{encode_metrics, init_telemetry};
use engine_runtime::{EngineConfig, EngineRuntime, InMemoryContentStore};
use std::path::PathBuf;
use std::sync::Arc;
use tl_03_fetch_retry::SystemTimeSource;
use tl_04_subscribed_view::TrustEveryone;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = EngineConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    let mut runtime = EngineRuntime::new(
        config,
        Arc::new(InMemoryContentStore::new()),
        Arc::new(TrustEveryone),
        Arc::new(SystemTimeSource),
    )
    .context("Failed to build engine runtime")?;
    runtime.start()?;

    let status = serde_json::to_string_pretty(&runtime.engine().status())?;
    info!("Engine status:\n{status}");

    info!("Threadloom is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    let engine = runtime.engine();
    runtime.shutdown().await?;
    info!("Final status: {}", serde_json::to_string(&engine.status())?);
    debug!("Metrics:\n{}", encode_metrics()?);
    Ok(())
}

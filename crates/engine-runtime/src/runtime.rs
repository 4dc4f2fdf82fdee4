//! # Engine Runtime
//!
//! Owns the engine, the bus and the background tasks.
//!
//! ## Startup
//!
//! 1. Open the snapshot store (if configured) and restore the engine
//! 2. Subscribe the event router to engine inputs
//! 3. Spawn the router and the fetch scheduler
//!
//! ## Shutdown
//!
//! 1. Signal both tasks and wait for them
//! 2. Save a final snapshot

use crate::config::EngineConfig;
use crate::engine::{BoardEngine, EngineError};
use crate::persistence::{FileSnapshotStore, SnapshotError};
use crate::ports::ContentStore;
use crate::wiring::{EventRouter, FetchScheduler};
use board_telemetry::log_event;
use shared_bus::{EventFilter, InMemoryEventBus};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tl_03_fetch_retry::TimeSource;
use tl_04_subscribed_view::TrustOracle;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Runtime already started")]
    AlreadyStarted,
}

pub struct EngineRuntime {
    config: EngineConfig,
    engine: Arc<BoardEngine>,
    bus: Arc<InMemoryEventBus>,
    store: Arc<dyn ContentStore>,
    snapshots: Option<FileSnapshotStore>,
    /// Wakes the scheduler ahead of its interval.
    wake: Arc<Notify>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl EngineRuntime {
    /// Build the runtime and restore the last snapshot, if any.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn ContentStore>,
        oracle: Arc<dyn TrustOracle>,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self, RuntimeError> {
        let engine = Arc::new(BoardEngine::new(config.clone(), oracle, time));

        let snapshots = match &config.snapshot_path {
            Some(path) => {
                let snapshots = FileSnapshotStore::open(path)?;
                if let Some(snapshot) = snapshots.load()? {
                    engine.restore(snapshot)?;
                }
                Some(snapshots)
            }
            None => None,
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            bus: Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity)),
            config,
            engine,
            store,
            snapshots,
            wake: Arc::new(Notify::new()),
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        })
    }

    pub fn engine(&self) -> Arc<BoardEngine> {
        Arc::clone(&self.engine)
    }

    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    /// Ask the scheduler for a pass now.
    pub fn wake_scheduler(&self) {
        self.wake.notify_one();
    }

    /// Spawn the event router and the fetch scheduler.
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        if !self.tasks.is_empty() {
            return Err(RuntimeError::AlreadyStarted);
        }

        // Subscribe before spawning so no early event is missed.
        let inputs = self.bus.subscribe(EventFilter::engine_inputs());
        let router = EventRouter::new(self.engine(), self.bus(), Arc::clone(&self.wake));
        self.tasks
            .push(tokio::spawn(router.run(inputs, self.shutdown_rx.clone())));

        let scheduler = FetchScheduler::new(self.engine(), Arc::clone(&self.store), self.bus());
        let interval = Duration::from_secs(self.config.sweep_interval_secs);
        self.tasks.push(tokio::spawn(scheduler.run(
            interval,
            Arc::clone(&self.wake),
            self.shutdown_rx.clone(),
        )));

        log_event!(
            info,
            "engine-runtime",
            "Engine runtime started",
            boards = self.engine.board_names().len(),
            bus_capacity = self.config.bus_capacity
        );
        Ok(())
    }

    /// Write a snapshot now. A no-op without a snapshot path.
    pub fn save_snapshot(&self) -> Result<(), RuntimeError> {
        if let Some(snapshots) = &self.snapshots {
            snapshots.save(&self.engine.snapshot())?;
        }
        Ok(())
    }

    /// Stop the background tasks and persist the final state.
    pub async fn shutdown(mut self) -> Result<(), RuntimeError> {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!(error = %e, "Background task ended abnormally");
            }
        }
        self.save_snapshot()?;
        log_event!(info, "engine-runtime", "Shutdown complete");
        Ok(())
    }
}

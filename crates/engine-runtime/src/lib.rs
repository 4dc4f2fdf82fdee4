//! # Threadloom Engine Runtime
//!
//! The board engine facade and the daemon around it.
//!
//! ## Modules
//!
//! - `config/` - `EngineConfig`: defaults, TOML file, `TL_*` environment
//! - `engine/` - `BoardEngine`: arrivals, deletion cascade, queries, outbox
//! - `persistence/` - bincode snapshots behind an exclusive file lock
//! - `ports/` - the `ContentStore` the engine fetches from and publishes to
//! - `adapters/` - in-memory `ContentStore`
//! - `wiring/` - event router and fetch scheduler on the shared bus
//! - `runtime` - task lifecycle
//!
//! ## Quick start
//!
//! ```rust,ignore
//! let engine = BoardEngine::with_defaults(EngineConfig::default());
//! engine.subscribe(me, board.clone());
//! engine.on_message_received(message, Some(author))?;
//! for link in engine.get_threads(&me, &board)?.iter() {
//!     println!("{:?} {}", link.title(), link.visible_replies);
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod engine;
pub mod persistence;
pub mod ports;
pub mod runtime;
pub mod wiring;

pub use adapters::InMemoryContentStore;
pub use config::{ConfigError, EngineConfig};
pub use engine::{
    ArrivalReport, BoardEngine, BoardHandle, DeletionPlan, DeletionReport, EngineError, EngineResult,
    EngineStatus, Outbox, OutboxEntry, OutboxState,
};
pub use persistence::{EngineSnapshot, FileSnapshotStore, SnapshotError, SNAPSHOT_VERSION};
pub use ports::ContentStore;
pub use runtime::{EngineRuntime, RuntimeError};
pub use wiring::{EventRouter, FetchPass, FetchScheduler};

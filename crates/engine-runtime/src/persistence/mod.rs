//! Snapshot persistence.

pub mod snapshot;

pub use snapshot::{EngineSnapshot, FileSnapshotStore, SnapshotError, SnapshotResult, SNAPSHOT_VERSION};

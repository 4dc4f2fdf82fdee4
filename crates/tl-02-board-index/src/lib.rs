//! # Board Index (tl-02)
//!
//! Holds, per board, the forest of reply trees and folds arriving messages
//! into it regardless of arrival order.
//!
//! ## Reconciliation Rules
//!
//! | Arrival | Effect |
//! |---------|--------|
//! | thread root | tree root resolved; absolute orphans of that thread adopted |
//! | reply, parent known in board | linked under the parent |
//! | reply, parent unknown | linked under a ghost for the parent |
//! | message matching a ghost | replaces the ghost, inherits its children |
//! | duplicate id | no-op |
//!
//! ## Domain Invariants
//!
//! | ID | Invariant |
//! |----|-----------|
//! | 1 | The graph is a function of the board's message set and ghost-thread tombstones, never of arrival order |
//! | 2 | Every stored message is reachable from a thread entry |
//! | 3 | A ghost exists iff at least one stored message names it as parent |
//! | 4 | Parent links follow `(created, id)` order strictly, so the graph is acyclic |
//!
//! ## Crate Structure
//!
//! - `domain/slots.rs` - tree nodes, ghosts and root slots
//! - `domain/graph/` - the board graph: ingestion, removal, queries
//! - `domain/report.rs` - per-operation reports used for logging and metrics

pub mod domain;

pub use domain::errors::{BoardIndexError, BoardIndexResult};
pub use domain::graph::{BoardGraph, ThreadEntry, ThreadKind};
pub use domain::report::{AuthorFootprint, IngestOutcome, IngestReport, RemovalReport};
pub use domain::slots::{GhostReference, ParentLink, ReplyNode, RootSlot, ThreadSlot, ThreadTree};

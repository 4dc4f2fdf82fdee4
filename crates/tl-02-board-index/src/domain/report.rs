//! # Operation Reports
//!
//! What an ingestion or removal changed in one board. Consumed by the
//! engine for logging, metrics and change notifications.

use shared_types::{BoardName, MessageId};
use std::collections::BTreeSet;

/// Whether the message was new to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Inserted,
    Duplicate,
}

/// Effect of ingesting one message into one board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub board: BoardName,
    pub message_id: MessageId,
    pub outcome: IngestOutcome,
    /// Ghosts created for missing parents (the message's own or inherited).
    pub ghosts_created: Vec<MessageId>,
    /// The message filled at least one ghost.
    pub ghost_resolved: bool,
    /// Absolute orphans that joined the thread rooted by this message.
    pub orphans_adopted: usize,
    /// Parent set but thread missing.
    pub inconsistent_reference: bool,
    /// The message landed among the absolute orphans.
    pub orphaned: bool,
}

impl IngestReport {
    pub(crate) fn new(board: BoardName, message_id: MessageId, outcome: IngestOutcome) -> Self {
        Self {
            board,
            message_id,
            outcome,
            ghosts_created: Vec::new(),
            ghost_resolved: false,
            orphans_adopted: 0,
            inconsistent_reference: false,
            orphaned: false,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.outcome == IngestOutcome::Duplicate
    }
}

/// Effect of removing messages from one board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub removed: Vec<MessageId>,
    /// Removed replies that left a ghost behind for their children.
    pub ghosts_left: BTreeSet<MessageId>,
    /// Removed roots whose replies now form a ghost thread.
    pub ghost_threads: BTreeSet<MessageId>,
    /// Threads that disappeared entirely.
    pub threads_removed: BTreeSet<MessageId>,
    /// Ghosts that no longer exist after the removal.
    pub ghosts_vanished: BTreeSet<MessageId>,
}

impl RemovalReport {
    pub(crate) fn merge(&mut self, other: RemovalReport) {
        self.removed.extend(other.removed);
        self.ghosts_left.extend(other.ghosts_left);
        self.ghost_threads.extend(other.ghost_threads);
        self.threads_removed.extend(other.threads_removed);
        self.ghosts_vanished.extend(other.ghosts_vanished);
    }
}

/// What an identity owns in one board, computed without mutating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorFootprint {
    pub messages: usize,
    pub threads_rooted: usize,
    /// Threads containing at least one of the author's messages.
    pub threads_touched: BTreeSet<MessageId>,
}

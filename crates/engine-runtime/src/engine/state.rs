//! Taking and restoring engine snapshots.

use super::{BoardEngine, EngineError, EngineResult};
use crate::persistence::{EngineSnapshot, SNAPSHOT_VERSION};
use board_telemetry::BOARDS_TRACKED;
use parking_lot::RwLock;
use shared_types::{BoardName, Message, MessageId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tl_02_board_index::BoardGraph;
use tracing::info;

impl BoardEngine {
    /// Capture the engine state.
    ///
    /// Boards are read one at a time, so a snapshot taken while arrivals
    /// are applied may see some boards before and others after an arrival.
    /// Restoring it still yields consistent graphs.
    pub fn snapshot(&self) -> EngineSnapshot {
        let mut boards = Vec::new();
        let mut messages: BTreeMap<MessageId, Message> = BTreeMap::new();
        let mut ghost_threads = BTreeMap::new();

        for (name, handle) in self.board_handles() {
            let graph = handle.read();
            for message in graph.messages() {
                messages.entry(message.id).or_insert_with(|| message.clone());
            }
            if !graph.ghost_threads().is_empty() {
                ghost_threads.insert(name.clone(), graph.ghost_threads().iter().copied().collect());
            }
            boards.push(name);
        }

        EngineSnapshot {
            version: SNAPSHOT_VERSION,
            taken_at: self.now(),
            boards,
            messages: messages.into_values().collect(),
            ghost_threads,
            lists: self.lists.lists(),
            markers: self.retry.markers(),
            subscriptions: self.view.subscriptions(),
            outbox: self.outbox.read().clone(),
            deleted_identities: self.deleted_identities.read().iter().copied().collect(),
        }
    }

    /// Rebuild state from `snapshot`. Meant for a freshly built engine:
    /// boards are replaced, lists and markers are merged into what is there.
    pub fn restore(&self, snapshot: EngineSnapshot) -> EngineResult<()> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(EngineError::SnapshotVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut names: BTreeSet<BoardName> = snapshot.boards.into_iter().collect();
        names.extend(snapshot.ghost_threads.keys().cloned());
        for message in &snapshot.messages {
            names.extend(message.boards.iter().cloned());
        }

        let mut tombstones = snapshot.ghost_threads;
        let mut rebuilt = BTreeMap::new();
        for name in names {
            let ghosts = tombstones.remove(&name).unwrap_or_default();
            let graph = BoardGraph::rebuild(name.clone(), snapshot.messages.iter().cloned(), ghosts);
            rebuilt.insert(name, Arc::new(RwLock::new(graph)));
        }
        let board_count = rebuilt.len();
        *self.boards.write() = rebuilt;
        BOARDS_TRACKED.set(board_count as f64);

        self.lists.restore(snapshot.lists);
        for message in &snapshot.messages {
            self.lists.mark_downloaded(&message.id);
        }
        self.retry.load(snapshot.markers);
        self.view.restore(snapshot.subscriptions);
        *self.outbox.write() = snapshot.outbox;
        self.deleted_identities
            .write()
            .extend(snapshot.deleted_identities);

        info!(
            boards = board_count,
            messages = snapshot.messages.len(),
            taken_at = snapshot.taken_at,
            "Engine restored from snapshot"
        );
        Ok(())
    }
}

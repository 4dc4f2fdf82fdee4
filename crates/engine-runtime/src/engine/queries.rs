//! Subscriptions and viewer queries.
//!
//! Every query runs under the board's read lock and projects the graph
//! afresh; nothing is cached between calls.

use super::{BoardEngine, EngineError, EngineResult};
use board_telemetry::FETCH_MARKERS;
use serde::Serialize;
use shared_types::{BoardName, IdentityId, Message, MessageId};
use tl_02_board_index::BoardGraph;
use tl_04_subscribed_view::{BoardReplyLink, BoardThreadLink, Listing};

/// Point-in-time counters, dumped as JSON by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub boards: usize,
    pub messages: usize,
    pub ghosts: usize,
    pub ghost_threads: usize,
    pub absolute_orphans: usize,
    pub message_lists: usize,
    pub pending_fetches: usize,
    pub fetch_markers: usize,
    pub subscriptions: usize,
    pub outbox: usize,
    pub deleted_identities: usize,
}

impl BoardEngine {
    /// Subscribe `viewer` to `board`, starting to track the board if needed.
    pub fn subscribe(&self, viewer: IdentityId, board: BoardName) -> bool {
        self.board_or_create(&board);
        self.view.subscribe(viewer, board)
    }

    pub fn unsubscribe(&self, viewer: &IdentityId, board: &BoardName) -> bool {
        self.view.unsubscribe(viewer, board)
    }

    pub fn is_subscribed(&self, viewer: &IdentityId, board: &BoardName) -> bool {
        self.view.is_subscribed(viewer, board)
    }

    /// Run `f` against the board's graph under its read lock. An untracked
    /// board reads as empty.
    fn with_graph<T>(&self, board: &BoardName, f: impl FnOnce(&BoardGraph) -> T) -> T {
        match self.board(board) {
            Some(handle) => f(&handle.read()),
            None => f(&BoardGraph::new(board.clone())),
        }
    }

    pub fn get_threads(&self, viewer: &IdentityId, board: &BoardName) -> EngineResult<Listing<BoardThreadLink>> {
        self.with_graph(board, |graph| self.view.get_threads(viewer, graph))
            .map_err(EngineError::from)
    }

    pub fn get_replies(
        &self,
        viewer: &IdentityId,
        board: &BoardName,
        thread_id: &MessageId,
    ) -> EngineResult<Listing<BoardReplyLink>> {
        self.with_graph(board, |graph| self.view.get_replies(viewer, graph, thread_id))
            .map_err(EngineError::from)
    }

    /// Replies in `thread_id` the viewer wants to see.
    pub fn thread_reply_count(&self, viewer: &IdentityId, board: &BoardName, thread_id: &MessageId) -> EngineResult<usize> {
        self.with_graph(board, |graph| self.view.thread_reply_count(viewer, graph, thread_id))
            .map_err(EngineError::from)
    }

    /// Messages in `board` the viewer wants to see.
    pub fn message_count(&self, viewer: &IdentityId, board: &BoardName) -> EngineResult<usize> {
        self.with_graph(board, |graph| self.view.message_count(viewer, graph))
            .map_err(EngineError::from)
    }

    /// Unfiltered message count of a tracked board.
    pub fn board_message_count(&self, board: &BoardName) -> EngineResult<usize> {
        self.board(board)
            .map(|handle| handle.read().message_count())
            .ok_or_else(|| EngineError::UnknownBoard(board.clone()))
    }

    /// A stored message, looked up across boards.
    pub fn message(&self, id: &MessageId) -> Option<Message> {
        self.board_handles()
            .into_iter()
            .find_map(|(_, handle)| handle.read().message(id).cloned())
    }

    pub fn status(&self) -> EngineStatus {
        let mut status = EngineStatus::default();
        let mut messages = std::collections::BTreeSet::new();

        for (_, handle) in self.board_handles() {
            let graph = handle.read();
            status.boards += 1;
            messages.extend(graph.messages().map(|m| m.id));
            status.ghosts += graph.ghost_ids().len();
            status.ghost_threads += graph.ghost_threads().len();
            status.absolute_orphans += graph.absolute_orphans().len();
        }

        status.messages = messages.len();
        status.message_lists = self.lists.len();
        status.pending_fetches = self.messages_to_fetch().len();
        status.fetch_markers = self.retry.len();
        status.subscriptions = self.view.subscriptions().len();
        status.outbox = self.outbox.read().len();
        status.deleted_identities = self.deleted_identities.read().len();
        FETCH_MARKERS.set(status.fetch_markers as f64);
        status
    }
}

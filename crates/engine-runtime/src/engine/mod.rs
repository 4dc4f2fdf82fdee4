//! # Board Engine
//!
//! The facade collaborators talk to. It owns one [`BoardGraph`] per board
//! plus the message list index, the retry tracker, the subscribed view and
//! the own-message outbox.
//!
//! ## Locking
//!
//! | Lock | Guards | Held while |
//! |------|--------|------------|
//! | `boards` | board name -> graph handle | looking up or creating a handle |
//! | per-board `RwLock` | one `BoardGraph` | one single-board sub-operation |
//! | `deleted_identities` | identity tombstones | a lookup, possibly under a board lock |
//!
//! The map lock is always released before a board lock is taken. A
//! crossposted message is split into one sub-operation per board, taken in
//! board-name order, so no thread ever holds two board locks. Deletion
//! writes its tombstone before taking any board lock.

mod arrivals;
mod deletion;
mod errors;
mod outbox;
mod queries;
mod state;

pub use arrivals::ArrivalReport;
pub use deletion::{DeletionPlan, DeletionReport};
pub use errors::{EngineError, EngineResult};
pub use outbox::{Outbox, OutboxEntry, OutboxState};
pub use queries::EngineStatus;

use crate::config::EngineConfig;
use board_telemetry::BOARDS_TRACKED;
use parking_lot::RwLock;
use shared_types::{BoardName, IdentityId, Timestamp};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tl_01_message_lists::MessageListService;
use tl_02_board_index::BoardGraph;
use tl_03_fetch_retry::{FetchRetryService, SystemTimeSource, TimeSource};
use tl_04_subscribed_view::{SubscribedView, TrustEveryone, TrustOracle};

/// Shared handle to one board's graph.
pub type BoardHandle = Arc<RwLock<BoardGraph>>;

pub struct BoardEngine {
    config: EngineConfig,
    boards: RwLock<BTreeMap<BoardName, BoardHandle>>,
    lists: MessageListService,
    retry: FetchRetryService,
    view: SubscribedView,
    outbox: RwLock<Outbox>,
    /// Identities whose content is gone for good; later arrivals are refused.
    deleted_identities: RwLock<BTreeSet<IdentityId>>,
    time: Arc<dyn TimeSource>,
}

impl BoardEngine {
    pub fn new(config: EngineConfig, oracle: Arc<dyn TrustOracle>, time: Arc<dyn TimeSource>) -> Self {
        Self {
            lists: MessageListService::new(config.lists.clone()),
            retry: FetchRetryService::new(config.retry.clone()),
            view: SubscribedView::new(oracle),
            boards: RwLock::new(BTreeMap::new()),
            outbox: RwLock::new(Outbox::new()),
            deleted_identities: RwLock::new(BTreeSet::new()),
            config,
            time,
        }
    }

    /// Engine trusting every author, on wall-clock time.
    pub fn with_defaults(config: EngineConfig) -> Self {
        Self::new(config, Arc::new(TrustEveryone), Arc::new(SystemTimeSource))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.time.now()
    }

    /// Handle for `name`, if the board is tracked.
    pub fn board(&self, name: &BoardName) -> Option<BoardHandle> {
        self.boards.read().get(name).cloned()
    }

    /// Handle for `name`, creating an empty graph on first use.
    pub(crate) fn board_or_create(&self, name: &BoardName) -> BoardHandle {
        if let Some(handle) = self.board(name) {
            return handle;
        }
        let mut boards = self.boards.write();
        let handle = boards
            .entry(name.clone())
            .or_insert_with(|| Arc::new(RwLock::new(BoardGraph::new(name.clone()))))
            .clone();
        BOARDS_TRACKED.set(boards.len() as f64);
        handle
    }

    /// Every tracked board with its handle, in name order.
    pub(crate) fn board_handles(&self) -> Vec<(BoardName, BoardHandle)> {
        self.boards
            .read()
            .iter()
            .map(|(name, handle)| (name.clone(), Arc::clone(handle)))
            .collect()
    }

    pub fn board_names(&self) -> Vec<BoardName> {
        self.boards.read().keys().cloned().collect()
    }

    pub fn is_deleted(&self, identity: &IdentityId) -> bool {
        self.deleted_identities.read().contains(identity)
    }

    pub fn lists(&self) -> &MessageListService {
        &self.lists
    }

    pub fn retry(&self) -> &FetchRetryService {
        &self.retry
    }

    pub fn view(&self) -> &SubscribedView {
        &self.view
    }
}

//! # Subscribed View Service
//!
//! Checks subscriptions, then delegates to the pure projections. Callers
//! pass the board graph they hold a read lock on; the service never takes
//! a board lock itself.

use crate::domain::errors::{ViewError, ViewResult};
use crate::domain::links::{BoardReplyLink, BoardThreadLink};
use crate::domain::listing::Listing;
use crate::domain::projection::{project_replies, project_threads, visible_message_count};
use crate::domain::subscriptions::Subscriptions;
use crate::ports::outbound::TrustOracle;
use parking_lot::RwLock;
use shared_types::{BoardName, IdentityId, MessageId};
use std::sync::Arc;
use tl_02_board_index::BoardGraph;
use tracing::{debug, info};

pub struct SubscribedView {
    subscriptions: RwLock<Subscriptions>,
    oracle: Arc<dyn TrustOracle>,
}

impl SubscribedView {
    pub fn new(oracle: Arc<dyn TrustOracle>) -> Self {
        Self {
            subscriptions: RwLock::new(Subscriptions::new()),
            oracle,
        }
    }

    pub fn subscribe(&self, viewer: IdentityId, board: BoardName) -> bool {
        let added = self.subscriptions.write().subscribe(viewer, board.clone());
        if added {
            info!(viewer = %viewer.short(), board = %board, "Subscribed to board");
        }
        added
    }

    pub fn unsubscribe(&self, viewer: &IdentityId, board: &BoardName) -> bool {
        let removed = self.subscriptions.write().unsubscribe(viewer, board);
        if removed {
            info!(viewer = %viewer.short(), board = %board, "Unsubscribed from board");
        }
        removed
    }

    pub fn is_subscribed(&self, viewer: &IdentityId, board: &BoardName) -> bool {
        self.subscriptions.read().is_subscribed(viewer, board)
    }

    pub fn boards_of(&self, viewer: &IdentityId) -> Vec<BoardName> {
        self.subscriptions.read().boards_of(viewer).into_iter().collect()
    }

    /// Drop all subscriptions of a deleted own identity.
    pub fn remove_viewer(&self, viewer: &IdentityId) -> usize {
        self.subscriptions.write().remove_viewer(viewer)
    }

    pub fn subscriptions(&self) -> Subscriptions {
        self.subscriptions.read().clone()
    }

    pub fn restore(&self, subscriptions: Subscriptions) {
        *self.subscriptions.write() = subscriptions;
    }

    fn ensure_subscribed(&self, viewer: &IdentityId, board: &BoardName) -> ViewResult<()> {
        if self.is_subscribed(viewer, board) {
            Ok(())
        } else {
            Err(ViewError::NotSubscribed {
                viewer: *viewer,
                board: board.clone(),
            })
        }
    }

    pub fn get_threads(&self, viewer: &IdentityId, graph: &BoardGraph) -> ViewResult<Listing<BoardThreadLink>> {
        self.ensure_subscribed(viewer, graph.name())?;
        let links = project_threads(viewer, graph, self.oracle.as_ref());
        debug!(board = %graph.name(), threads = links.len(), "Listed threads");
        Ok(Listing::new(links))
    }

    pub fn get_replies(
        &self,
        viewer: &IdentityId,
        graph: &BoardGraph,
        thread_id: &MessageId,
    ) -> ViewResult<Listing<BoardReplyLink>> {
        self.ensure_subscribed(viewer, graph.name())?;
        project_replies(viewer, graph, thread_id, self.oracle.as_ref()).map(Listing::new)
    }

    pub fn thread_reply_count(&self, viewer: &IdentityId, graph: &BoardGraph, thread_id: &MessageId) -> ViewResult<usize> {
        self.get_replies(viewer, graph, thread_id).map(|listing| listing.len())
    }

    pub fn message_count(&self, viewer: &IdentityId, graph: &BoardGraph) -> ViewResult<usize> {
        self.ensure_subscribed(viewer, graph.name())?;
        Ok(visible_message_count(viewer, graph, self.oracle.as_ref()))
    }
}

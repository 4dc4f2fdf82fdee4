//! # Identity Deletion Cascade
//!
//! Removing an identity deletes every message and message list it
//! authored. Replies by others survive:
//!
//! - a thread rooted by the identity becomes a ghost thread when replies
//!   remain, and disappears otherwise
//! - a reply by the identity that has children is replaced by a ghost
//!   holding them
//!
//! Fetch markers for the identity's subjects go with it, as do markers for
//! ghosts that no longer exist anywhere and are not announced by a list.

use super::BoardEngine;
use board_telemetry::{log_identity_event, metric_inc, IDENTITY_DELETIONS};
use serde::Serialize;
use shared_types::{BoardName, IdentityId, MessageId};
use std::collections::{BTreeMap, BTreeSet};
use tl_02_board_index::RemovalReport;

/// What a deletion would remove, computed without mutating anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionPlan {
    pub identity: IdentityId,
    /// Distinct messages; a crosspost counts once.
    pub messages: usize,
    pub message_lists: usize,
    pub list_references: usize,
    pub boards: Vec<BoardName>,
    pub threads_rooted: usize,
    pub threads_touched: usize,
    pub queued_own_messages: usize,
}

impl DeletionPlan {
    pub fn is_empty(&self) -> bool {
        self.messages == 0 && self.message_lists == 0 && self.queued_own_messages == 0
    }
}

/// What a deletion removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub identity: IdentityId,
    pub messages_removed: usize,
    pub lists_removed: usize,
    pub references_removed: usize,
    pub markers_pruned: usize,
    pub subscriptions_removed: usize,
    pub outbox_dropped: usize,
    /// Per-board graph changes, for boards the identity had content in.
    pub boards: BTreeMap<BoardName, RemovalReport>,
}

impl DeletionReport {
    /// Ghost threads left behind, per board.
    pub fn ghost_threads(&self) -> BTreeMap<BoardName, BTreeSet<MessageId>> {
        self.boards
            .iter()
            .filter(|(_, r)| !r.ghost_threads.is_empty())
            .map(|(b, r)| (b.clone(), r.ghost_threads.clone()))
            .collect()
    }
}

impl BoardEngine {
    pub fn before_identity_deletion(&self, identity: &IdentityId) -> DeletionPlan {
        let mut plan = DeletionPlan {
            identity: *identity,
            ..DeletionPlan::default()
        };
        let mut messages = BTreeSet::new();

        for (name, handle) in self.board_handles() {
            let graph = handle.read();
            let footprint = graph.author_footprint(identity);
            if footprint.messages == 0 {
                continue;
            }
            messages.extend(graph.messages().filter(|m| m.author() == *identity).map(|m| m.id));
            plan.threads_rooted += footprint.threads_rooted;
            plan.threads_touched += footprint.threads_touched.len();
            plan.boards.push(name);
        }

        plan.messages = messages.len();
        (plan.message_lists, plan.list_references) = self.lists.count_for(identity);
        plan.queued_own_messages = self.outbox.read().count_for(identity);
        plan
    }

    /// Delete everything authored by `identity`.
    ///
    /// The identity is tombstoned first, so arrivals racing with the cascade
    /// are refused instead of resurrecting content.
    pub fn on_identity_deletion(&self, identity: &IdentityId) -> DeletionReport {
        self.deleted_identities.write().insert(*identity);

        let mut report = DeletionReport {
            identity: *identity,
            ..DeletionReport::default()
        };
        let mut removed = BTreeSet::new();
        let mut vanished = BTreeSet::new();

        for (name, handle) in self.board_handles() {
            let board_report = handle.write().remove_author(identity);
            if board_report.removed.is_empty() {
                continue;
            }
            removed.extend(board_report.removed.iter().copied());
            vanished.extend(board_report.ghosts_vanished.iter().copied());
            report.boards.insert(name, board_report);
        }
        report.messages_removed = removed.len();

        let lists = self.lists.remove_author(identity);
        report.lists_removed = lists.lists.len();
        report.references_removed = lists.references;

        report.markers_pruned = self.retry.prune_author(identity);
        let still_wanted: BTreeSet<MessageId> = self
            .lists
            .messages_to_fetch()
            .into_iter()
            .map(|r| r.message_id)
            .collect();
        let orphaned_markers: Vec<MessageId> = vanished
            .into_iter()
            .filter(|id| !still_wanted.contains(id) && !self.is_ghost_anywhere(id))
            .collect();
        report.markers_pruned += self.retry.prune_subjects(orphaned_markers.iter());

        report.subscriptions_removed = self.view.remove_viewer(identity);
        report.outbox_dropped = self.outbox.write().remove_author(identity);

        metric_inc!(IDENTITY_DELETIONS);
        log_identity_event!(
            info,
            "Identity deleted",
            identity.short(),
            messages = report.messages_removed,
            lists = report.lists_removed,
            markers = report.markers_pruned,
            ghost_threads = report.ghost_threads().values().map(BTreeSet::len).sum::<usize>()
        );
        report
    }

    fn is_ghost_anywhere(&self, id: &MessageId) -> bool {
        self.board_handles()
            .iter()
            .any(|(_, handle)| handle.read().has_ghost(id))
    }
}

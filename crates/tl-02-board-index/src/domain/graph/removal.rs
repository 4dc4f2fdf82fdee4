//! Removing messages: identity deletion cascades and un-sent own messages.

use super::BoardGraph;
use crate::domain::report::{AuthorFootprint, RemovalReport};
use crate::domain::slots::{RootSlot, ThreadSlot};
use shared_types::{IdentityId, MessageId};
use tracing::debug;

impl BoardGraph {
    /// Remove one message.
    ///
    /// A removed root whose thread still has replies becomes a ghost thread
    /// when `tombstone` is set, an orphan group otherwise. A removed reply
    /// with children is replaced by a ghost holding them.
    pub fn remove_message(&mut self, id: &MessageId, tombstone: bool) -> Option<RemovalReport> {
        let ghosts_before = self.ghost_ids();
        let message = self.messages.get(id)?.clone();
        let mut report = RemovalReport::default();
        // The member cutting a loop through `id` rejoins its parent once the loop is open.
        let breaker = self
            .cycle_breaker(&message)
            .filter(|b| b != id && self.messages.get(b).and_then(|m| m.parent_id) != Some(*id));

        // Detach from the parent while the message is still stored.
        if message.thread_id.is_some() {
            self.unlink_stored(id);
        }

        self.messages.remove(id);
        self.inconsistent.remove(id);
        if let (Some(parent_id), Some(_)) = (message.parent_id, message.thread_id) {
            if let Some(siblings) = self.children_index.get_mut(&parent_id) {
                siblings.remove(id);
                if siblings.is_empty() {
                    self.children_index.remove(&parent_id);
                }
            }
        }

        let tree_key = Self::tree_key(&message);
        if let Some(tree) = self.threads.get_mut(&tree_key) {
            if message.thread_id.is_none() {
                tree.root = match (tree.is_empty(), tombstone) {
                    (true, _) => RootSlot::Unknown,
                    (false, true) => {
                        self.ghost_threads.insert(tree_key);
                        report.ghost_threads.insert(tree_key);
                        RootSlot::Ghost
                    }
                    (false, false) => RootSlot::Unknown,
                };
            } else if let Some(ThreadSlot::Resolved(_)) = tree.nodes.get(id) {
                tree.nodes.remove(id);
            }
        }

        for child in self.waiting_on(id) {
            if let Some(ghost) = self.relocate_stored(&child) {
                report.ghosts_left.insert(ghost);
            }
        }
        if let Some(breaker) = breaker {
            self.relocate_stored(&breaker);
        }

        self.drop_tree_if_abandoned(&tree_key, &mut report);

        let ghosts_after = self.ghost_ids();
        report.ghosts_vanished = ghosts_before.difference(&ghosts_after).copied().collect();
        report.removed.push(*id);

        debug!(
            board = %self.name,
            message_id = %id,
            ghosts_left = report.ghosts_left.len(),
            "Message removed"
        );
        Some(report)
    }

    /// Remove a tree whose root is not stored and that has no members left.
    fn drop_tree_if_abandoned(&mut self, tree_key: &MessageId, report: &mut RemovalReport) {
        let abandoned = self
            .threads
            .get(tree_key)
            .is_some_and(|tree| tree.root != RootSlot::Resolved && tree.is_empty());
        if abandoned {
            self.threads.remove(tree_key);
            self.ghost_threads.remove(tree_key);
            report.ghost_threads.remove(tree_key);
            report.threads_removed.insert(*tree_key);
        }
    }

    /// Remove every message authored by `author`.
    pub fn remove_author(&mut self, author: &IdentityId) -> RemovalReport {
        let ghosts_before = self.ghost_ids();
        let mut ids: Vec<MessageId> = self
            .messages
            .keys()
            .filter(|id| id.author == *author)
            .copied()
            .collect();
        ids.sort();

        let mut report = RemovalReport::default();
        for id in &ids {
            if let Some(partial) = self.remove_message(id, true) {
                report.merge(partial);
            }
        }

        let ghosts_after = self.ghost_ids();
        report.ghosts_left.retain(|g| ghosts_after.contains(g));
        report.ghost_threads.retain(|t| self.ghost_threads.contains(t));
        report.threads_removed.retain(|t| !self.threads.contains_key(t));
        report.ghosts_vanished = ghosts_before.difference(&ghosts_after).copied().collect();
        report
    }

    /// What removing `author` would touch, without mutating.
    pub fn author_footprint(&self, author: &IdentityId) -> AuthorFootprint {
        let mut footprint = AuthorFootprint::default();
        for message in self.messages.values().filter(|m| m.author() == *author) {
            footprint.messages += 1;
            if message.thread_id.is_none() {
                footprint.threads_rooted += 1;
            }
            footprint.threads_touched.insert(Self::tree_key(message));
        }
        footprint
    }
}

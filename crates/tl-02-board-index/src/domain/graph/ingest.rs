//! Folding an arriving message into the graph.

use super::{BoardGraph, LinkNote};
use crate::domain::errors::{BoardIndexError, BoardIndexResult};
use crate::domain::report::{IngestOutcome, IngestReport};
use crate::domain::slots::{ParentLink, ReplyNode, RootSlot, ThreadTree};
use shared_types::Message;
use std::collections::BTreeSet;
use tracing::{debug, error, warn};

impl BoardGraph {
    /// Reconcile one message into this board.
    ///
    /// 1. Replies waiting on the message are detached from their ghosts.
    /// 2. The message takes its place: as a root (adopting absolute orphans)
    ///    or as a reply (creating a ghost for an unknown parent).
    /// 3. The waiting replies are re-linked under the message.
    /// 4. A parent-link loop the message closes is cut at its smallest member.
    pub fn ingest(&mut self, message: Message) -> BoardIndexResult<IngestReport> {
        if !message.targets(&self.name) {
            return Err(BoardIndexError::WrongBoard {
                board: self.name.clone(),
                message: message.id,
            });
        }

        let id = message.id;
        if let Some(existing) = self.messages.get(&id) {
            if !existing.same_content(&message) {
                error!(
                    board = %self.name,
                    message_id = %id,
                    "Same message id delivered with different content, keeping the first"
                );
                debug_assert!(false, "conflicting content for message {id}");
            }
            return Ok(IngestReport::new(self.name.clone(), id, IngestOutcome::Duplicate));
        }

        let mut report = IngestReport::new(self.name.clone(), id, IngestOutcome::Inserted);

        if let (Some(parent_id), Some(_)) = (message.parent_id, message.thread_id) {
            self.children_index.entry(parent_id).or_default().insert(id);
        }
        if message.has_inconsistent_reference() {
            warn!(
                board = %self.name,
                message_id = %id,
                "Message has a parent but no thread, treating it as a thread of its own"
            );
            self.inconsistent.insert(id);
            report.inconsistent_reference = true;
        }

        let waiting = self.waiting_on(&id);
        // A loop closed by this arrival is cut at a member already stored.
        let breaker = self
            .cycle_breaker(&message)
            .filter(|b| *b != id && !waiting.contains(b));
        for child in &waiting {
            if self.unlink_stored(child) {
                report.ghost_resolved = true;
            }
        }

        match message.thread_id {
            None => {
                let tree = self
                    .threads
                    .entry(id)
                    .or_insert_with(|| ThreadTree::new(id, RootSlot::Unknown));
                if tree.root == RootSlot::Unknown {
                    report.orphans_adopted = tree.reply_count();
                }
                tree.root = RootSlot::Resolved;
                self.ghost_threads.remove(&id);
                self.messages.insert(id, message);
            }
            Some(thread_id) => {
                let (link, note) = self.compute_link(&message, thread_id);
                match note {
                    LinkNote::Normal => {}
                    LinkNote::CrossThread => warn!(
                        board = %self.name,
                        message_id = %id,
                        thread_id = %thread_id,
                        "Parent belongs to another thread, linking under the root"
                    ),
                    LinkNote::Cycle => warn!(
                        board = %self.name,
                        message_id = %id,
                        "Parent links form a loop, linking under the root"
                    ),
                }

                let node = ReplyNode {
                    id,
                    created: message.created,
                    author: message.author(),
                    parent: link,
                    children: BTreeSet::new(),
                };
                self.messages.insert(id, message);

                let tree = self
                    .threads
                    .entry(thread_id)
                    .or_insert_with(|| ThreadTree::new(thread_id, RootSlot::Unknown));
                report.orphaned = tree.root == RootSlot::Unknown;
                if tree.insert_reply(node) {
                    if let ParentLink::Node(ghost) = link {
                        report.ghosts_created.push(ghost);
                    }
                }
            }
        }

        for child in &waiting {
            if let Some(ghost) = self.relink_stored(child) {
                report.ghosts_created.push(ghost);
            }
        }
        if let Some(breaker) = breaker {
            warn!(
                board = %self.name,
                message_id = %breaker,
                "Parent links form a loop, linking under the root"
            );
            self.relocate_stored(&breaker);
        }

        debug!(
            board = %self.name,
            message_id = %id,
            ghost_resolved = report.ghost_resolved,
            ghosts_created = report.ghosts_created.len(),
            orphans_adopted = report.orphans_adopted,
            "Message reconciled"
        );
        Ok(report)
    }
}

//! # Thread Trees
//!
//! A thread tree groups every message of one board that names the same
//! thread id. Non-root members live in `nodes`, either as resolved replies
//! or as ghosts standing in for parents that have not arrived.
//!
//! Ghosts always hang directly under the root: their own parent is unknown
//! until they are filled.

use serde::{Deserialize, Serialize};
use shared_types::{IdentityId, MessageId, Timestamp};
use std::collections::{BTreeMap, BTreeSet};

/// Where a resolved reply is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentLink {
    /// Directly under the thread root.
    Root,
    /// Under another member (resolved or ghost).
    Node(MessageId),
}

/// A reply whose message is stored in the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyNode {
    pub id: MessageId,
    pub created: Timestamp,
    pub author: IdentityId,
    pub parent: ParentLink,
    pub children: BTreeSet<MessageId>,
}

/// Placeholder for a referenced parent that has not arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostReference {
    pub id: MessageId,
    /// Earliest creation date among the waiting children.
    pub estimated_date: Timestamp,
    pub children: BTreeSet<MessageId>,
}

/// Member slot of a thread tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadSlot {
    Resolved(ReplyNode),
    Ghost(GhostReference),
}

impl ThreadSlot {
    pub fn children(&self) -> &BTreeSet<MessageId> {
        match self {
            ThreadSlot::Resolved(node) => &node.children,
            ThreadSlot::Ghost(ghost) => &ghost.children,
        }
    }

    pub fn is_ghost(&self) -> bool {
        matches!(self, ThreadSlot::Ghost(_))
    }
}

/// State of the thread root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootSlot {
    /// The root message is stored in the board.
    Resolved,
    /// The root was deleted; surviving replies form a ghost thread.
    Ghost,
    /// The root has never been seen; members are absolute orphans.
    Unknown,
}

/// All members of one thread in one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadTree {
    pub id: MessageId,
    pub root: RootSlot,
    /// Members attached directly under the root, ghosts included.
    pub top: BTreeSet<MessageId>,
    pub nodes: BTreeMap<MessageId, ThreadSlot>,
}

impl ThreadTree {
    pub fn new(id: MessageId, root: RootSlot) -> Self {
        Self {
            id,
            root,
            top: BTreeSet::new(),
            nodes: BTreeMap::new(),
        }
    }

    pub fn resolved(&self, id: &MessageId) -> Option<&ReplyNode> {
        match self.nodes.get(id) {
            Some(ThreadSlot::Resolved(node)) => Some(node),
            _ => None,
        }
    }

    pub fn ghost(&self, id: &MessageId) -> Option<&GhostReference> {
        match self.nodes.get(id) {
            Some(ThreadSlot::Ghost(ghost)) => Some(ghost),
            _ => None,
        }
    }

    pub fn ghosts(&self) -> impl Iterator<Item = &GhostReference> {
        self.nodes.values().filter_map(|slot| match slot {
            ThreadSlot::Ghost(ghost) => Some(ghost),
            ThreadSlot::Resolved(_) => None,
        })
    }

    pub fn replies(&self) -> impl Iterator<Item = &ReplyNode> {
        self.nodes.values().filter_map(|slot| match slot {
            ThreadSlot::Resolved(node) => Some(node),
            ThreadSlot::Ghost(_) => None,
        })
    }

    pub fn reply_count(&self) -> usize {
        self.replies().count()
    }

    /// No members left (the root slot alone does not count).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolved descendants of `id`, depth first.
    pub fn descendants(&self, id: &MessageId) -> Vec<MessageId> {
        let mut out = Vec::new();
        let mut stack: Vec<MessageId> = self
            .nodes
            .get(id)
            .map(|slot| slot.children().iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if let Some(slot) = self.nodes.get(&next) {
                if !slot.is_ghost() {
                    out.push(next);
                }
                stack.extend(slot.children().iter().rev().copied());
            }
        }
        out
    }

    /// Store a resolved reply and attach it. Returns true if a ghost parent
    /// had to be created.
    pub(crate) fn insert_reply(&mut self, node: ReplyNode) -> bool {
        let (id, created, parent) = (node.id, node.created, node.parent);
        self.nodes.insert(id, ThreadSlot::Resolved(node));
        self.link(id, created, parent)
    }

    /// Attach `child` under `parent`, creating a ghost when the parent slot
    /// does not exist. Returns true if a ghost was created.
    pub(crate) fn link(&mut self, child: MessageId, created: Timestamp, parent: ParentLink) -> bool {
        if let Some(ThreadSlot::Resolved(node)) = self.nodes.get_mut(&child) {
            node.parent = parent;
        }
        match parent {
            ParentLink::Root => {
                self.top.insert(child);
                false
            }
            ParentLink::Node(parent_id) => match self.nodes.get_mut(&parent_id) {
                Some(ThreadSlot::Resolved(node)) => {
                    node.children.insert(child);
                    false
                }
                Some(ThreadSlot::Ghost(ghost)) => {
                    ghost.children.insert(child);
                    ghost.estimated_date = ghost.estimated_date.min(created);
                    false
                }
                None => {
                    let ghost = GhostReference {
                        id: parent_id,
                        estimated_date: created,
                        children: [child].into_iter().collect(),
                    };
                    self.nodes.insert(parent_id, ThreadSlot::Ghost(ghost));
                    self.top.insert(parent_id);
                    true
                }
            },
        }
    }

    /// Detach `child` from `parent`. A ghost left without children is
    /// removed; returns true in that case.
    pub(crate) fn unlink(&mut self, child: &MessageId, parent: ParentLink) -> bool {
        let parent_id = match parent {
            ParentLink::Root => {
                self.top.remove(child);
                return false;
            }
            ParentLink::Node(parent_id) => parent_id,
        };

        let remaining = match self.nodes.get_mut(&parent_id) {
            Some(ThreadSlot::Resolved(node)) => {
                node.children.remove(child);
                return false;
            }
            Some(ThreadSlot::Ghost(ghost)) => {
                ghost.children.remove(child);
                ghost.children.clone()
            }
            None => return false,
        };

        if remaining.is_empty() {
            self.nodes.remove(&parent_id);
            self.top.remove(&parent_id);
            return true;
        }

        let estimated = remaining
            .iter()
            .filter_map(|c| self.resolved(c).map(|n| n.created))
            .min();
        if let (Some(ThreadSlot::Ghost(ghost)), Some(date)) = (self.nodes.get_mut(&parent_id), estimated) {
            ghost.estimated_date = date;
        }
        false
    }
}

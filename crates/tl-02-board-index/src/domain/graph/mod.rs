//! # Board Graph
//!
//! The unfiltered message graph of one board.
//!
//! ## Structure
//!
//! ```text
//! messages:       MessageId -> Message          (every message filed in the board)
//! threads:        thread id -> ThreadTree       (root slot + member slots)
//! children_index: parent id -> reply ids        (replies naming that parent)
//! ghost_threads:  deleted roots whose replies survive
//! ```
//!
//! ## Placement
//!
//! A reply with thread `t` and parent `p` is linked:
//!
//! - under the root when `p` is absent or equals `t`
//! - under `p` when `p` is stored in `t`
//! - under the root when `p` is stored in another thread
//! - under a ghost for `p` when `p` is not stored
//!
//! Creation dates play no part: authors' clocks disagree. Parent links
//! inside a thread can still loop when ids name each other. Each loop is
//! cut at its smallest `(created, id)` member, which links under the root.
//!
//! An arrival or removal of `m` relinks `m`, the replies naming `m`, and the
//! cutting member of a loop running through `m`.

mod ingest;
mod queries;
mod removal;


pub use queries::{ThreadEntry, ThreadKind};

use crate::domain::slots::{ParentLink, RootSlot, ThreadSlot, ThreadTree};
use shared_types::{BoardName, Message, MessageId, Timestamp};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Why a reply was not linked under its named parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkNote {
    Normal,
    /// Parent stored but filed in another thread.
    CrossThread,
    /// Reply cuts a loop of parent links.
    Cycle,
}

/// One board's thread forest.
#[derive(Debug, Clone)]
pub struct BoardGraph {
    name: BoardName,
    messages: HashMap<MessageId, Message>,
    threads: BTreeMap<MessageId, ThreadTree>,
    children_index: HashMap<MessageId, BTreeSet<MessageId>>,
    ghost_threads: BTreeSet<MessageId>,
    inconsistent: BTreeSet<MessageId>,
}

impl BoardGraph {
    pub fn new(name: BoardName) -> Self {
        Self {
            name,
            messages: HashMap::new(),
            threads: BTreeMap::new(),
            children_index: HashMap::new(),
            ghost_threads: BTreeSet::new(),
            inconsistent: BTreeSet::new(),
        }
    }

    /// Reconstruct a graph from its message set and ghost-thread tombstones.
    ///
    /// Messages not targeting `name` are skipped. The result equals the graph
    /// obtained by ingesting the same messages in any order.
    pub fn rebuild(
        name: BoardName,
        messages: impl IntoIterator<Item = Message>,
        ghost_threads: impl IntoIterator<Item = MessageId>,
    ) -> Self {
        let mut graph = Self::new(name);
        let mut sorted: Vec<Message> = messages
            .into_iter()
            .filter(|m| m.targets(&graph.name))
            .collect();
        sorted.sort_by_key(|m| m.id);
        for message in sorted {
            let _ = graph.ingest(message);
        }
        for thread_id in ghost_threads {
            graph.mark_ghost_thread(&thread_id);
        }
        graph
    }

    /// Turn an orphan group into a ghost thread.
    ///
    /// Only applies when the thread has members and its root is unknown.
    pub fn mark_ghost_thread(&mut self, thread_id: &MessageId) -> bool {
        match self.threads.get_mut(thread_id) {
            Some(tree) if tree.root == RootSlot::Unknown && !tree.is_empty() => {
                tree.root = RootSlot::Ghost;
                self.ghost_threads.insert(*thread_id);
                true
            }
            _ => false,
        }
    }

    pub fn name(&self) -> &BoardName {
        &self.name
    }

    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.get(id)
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.contains_key(id)
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn tree(&self, thread_id: &MessageId) -> Option<&ThreadTree> {
        self.threads.get(thread_id)
    }

    pub fn trees(&self) -> impl Iterator<Item = &ThreadTree> {
        self.threads.values()
    }

    pub fn ghost_threads(&self) -> &BTreeSet<MessageId> {
        &self.ghost_threads
    }

    /// Messages that carry a parent but no thread reference.
    pub fn inconsistent_references(&self) -> &BTreeSet<MessageId> {
        &self.inconsistent
    }

    /// True if any tree holds a ghost for `id`.
    pub fn has_ghost(&self, id: &MessageId) -> bool {
        self.threads.values().any(|tree| tree.ghost(id).is_some())
    }

    /// Every id currently standing as a ghost.
    pub fn ghost_ids(&self) -> BTreeSet<MessageId> {
        self.threads
            .values()
            .flat_map(|tree| tree.ghosts().map(|g| g.id))
            .collect()
    }

    /// Replies whose thread root has never been seen, plus thread-less
    /// messages carrying a parent.
    pub fn absolute_orphans(&self) -> BTreeSet<MessageId> {
        self.threads
            .values()
            .filter(|tree| tree.root == RootSlot::Unknown)
            .flat_map(|tree| tree.replies().map(|n| n.id))
            .chain(self.inconsistent.iter().copied())
            .collect()
    }

    pub fn is_absolute_orphan(&self, id: &MessageId) -> bool {
        if self.inconsistent.contains(id) {
            return true;
        }
        self.messages
            .get(id)
            .and_then(|m| m.thread_id)
            .and_then(|t| self.threads.get(&t))
            .is_some_and(|tree| tree.root == RootSlot::Unknown)
    }

    /// Tree key of a stored message: its thread, or itself for roots.
    fn tree_key(message: &Message) -> MessageId {
        message.thread_id.unwrap_or(message.id)
    }

    /// Where a stored or arriving reply belongs inside `thread_id`.
    pub(crate) fn compute_link(&self, message: &Message, thread_id: MessageId) -> (ParentLink, LinkNote) {
        let parent_id = match message.parent_id {
            None => return (ParentLink::Root, LinkNote::Normal),
            Some(p) if p == thread_id => return (ParentLink::Root, LinkNote::Normal),
            Some(p) => p,
        };

        match self.messages.get(&parent_id) {
            None => (ParentLink::Node(parent_id), LinkNote::Normal),
            Some(parent) if parent.thread_id != Some(thread_id) => (ParentLink::Root, LinkNote::CrossThread),
            Some(_) if self.cycle_breaker(message) == Some(message.id) => (ParentLink::Root, LinkNote::Cycle),
            Some(_) => (ParentLink::Node(parent_id), LinkNote::Normal),
        }
    }

    /// Members of the parent-link loop running through `message`. Only
    /// stored parents in the same thread are followed; `message` itself need
    /// not be stored yet.
    fn parent_cycle(&self, message: &Message) -> Option<Vec<(Timestamp, MessageId)>> {
        let thread_id = message.thread_id?;
        let mut members = vec![(message.created, message.id)];
        let mut seen = HashSet::new();
        let mut next = message.parent_id;
        while let Some(parent_id) = next.filter(|p| *p != thread_id) {
            if parent_id == message.id {
                return Some(members);
            }
            let parent = self
                .messages
                .get(&parent_id)
                .filter(|p| p.thread_id == Some(thread_id))?;
            // A loop further up that does not come back to `message`.
            if !seen.insert(parent_id) {
                return None;
            }
            members.push((parent.created, parent_id));
            next = parent.parent_id;
        }
        None
    }

    /// The member linked under the root to cut the loop through `message`.
    fn cycle_breaker(&self, message: &Message) -> Option<MessageId> {
        self.parent_cycle(message)?.into_iter().min().map(|(_, id)| id)
    }

    /// Move a stored reply to wherever `compute_link` now places it.
    fn relocate_stored(&mut self, id: &MessageId) -> Option<MessageId> {
        self.unlink_stored(id);
        self.relink_stored(id)
    }

    /// Detach a stored reply from its current parent. Returns true if a
    /// ghost disappeared as a result.
    fn unlink_stored(&mut self, id: &MessageId) -> bool {
        let Some(thread_id) = self.messages.get(id).and_then(|m| m.thread_id) else {
            return false;
        };
        let Some(tree) = self.threads.get_mut(&thread_id) else {
            return false;
        };
        let link = match tree.nodes.get(id) {
            Some(ThreadSlot::Resolved(node)) => node.parent,
            _ => return false,
        };
        tree.unlink(id, link)
    }

    /// Recompute and attach the link of a stored reply. Returns the ghost
    /// created for its parent, if any.
    fn relink_stored(&mut self, id: &MessageId) -> Option<MessageId> {
        let message = self.messages.get(id)?;
        let thread_id = message.thread_id?;
        let created = message.created;
        let (link, _) = self.compute_link(message, thread_id);
        let tree = self.threads.get_mut(&thread_id)?;
        match tree.link(*id, created, link) {
            true => match link {
                ParentLink::Node(ghost) => Some(ghost),
                ParentLink::Root => None,
            },
            false => None,
        }
    }

    /// Replies naming `parent_id`, in id order.
    fn waiting_on(&self, parent_id: &MessageId) -> Vec<MessageId> {
        self.children_index
            .get(parent_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl PartialEq for BoardGraph {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.messages == other.messages
            && self.threads == other.threads
            && self.ghost_threads == other.ghost_threads
            && self.inconsistent == other.inconsistent
    }
}

impl Eq for BoardGraph {}

//! Read-side queries: which entries a board shows as threads.
//!
//! | Tree root | Entries |
//! |-----------|---------|
//! | resolved | one, keyed by the root, holding every reply |
//! | ghost | one, keyed by the deleted root id, holding every reply |
//! | unknown | one per orphan not under a resolved parent, holding its subtree |

use super::BoardGraph;
use crate::domain::errors::{BoardIndexError, BoardIndexResult};
use crate::domain::slots::{ParentLink, ReplyNode, RootSlot, ThreadTree};
use shared_types::{Message, MessageId};

/// How a thread entry came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadKind {
    Resolved,
    GhostRoot,
    Orphan,
}

/// One thread as listed by a board.
#[derive(Debug, Clone)]
pub struct ThreadEntry<'a> {
    pub id: MessageId,
    pub kind: ThreadKind,
    /// The message heading the entry; `None` for ghost threads.
    pub head: Option<&'a Message>,
    /// Every stored message below the head.
    pub replies: Vec<&'a Message>,
}

impl<'a> ThreadEntry<'a> {
    /// Head (if stored) followed by the replies.
    pub fn messages(&self) -> impl Iterator<Item = &'a Message> + '_ {
        self.head.into_iter().chain(self.replies.iter().copied())
    }

    pub fn reply_count(&self) -> usize {
        self.replies.len()
    }
}

impl BoardGraph {
    /// All thread entries, in thread-id order. Ordering by activity is the
    /// view's concern.
    pub fn thread_entries(&self) -> Vec<ThreadEntry<'_>> {
        let mut entries = Vec::new();
        for tree in self.threads.values() {
            match tree.root {
                RootSlot::Resolved | RootSlot::Ghost => entries.push(self.whole_tree_entry(tree)),
                RootSlot::Unknown => {
                    for head in tree.replies().filter(|n| Self::heads_orphan_entry(tree, n)) {
                        entries.extend(self.orphan_entry(tree, head));
                    }
                }
            }
        }
        entries
    }

    /// The entry keyed by `id`.
    pub fn thread(&self, id: &MessageId) -> BoardIndexResult<ThreadEntry<'_>> {
        if let Some(tree) = self.threads.get(id) {
            if tree.root != RootSlot::Unknown {
                return Ok(self.whole_tree_entry(tree));
            }
        }

        self.messages
            .get(id)
            .and_then(|m| m.thread_id)
            .and_then(|t| self.threads.get(&t))
            .filter(|tree| tree.root == RootSlot::Unknown)
            .and_then(|tree| {
                tree.resolved(id)
                    .filter(|node| Self::heads_orphan_entry(tree, node))
                    .and_then(|node| self.orphan_entry(tree, node))
            })
            .ok_or(BoardIndexError::ThreadNotFound(*id))
    }

    pub fn thread_reply_count(&self, id: &MessageId) -> BoardIndexResult<usize> {
        self.thread(id).map(|entry| entry.reply_count())
    }

    fn whole_tree_entry(&self, tree: &ThreadTree) -> ThreadEntry<'_> {
        // A message with a parent but no thread is an orphan heading its own tree.
        let kind = match tree.root {
            RootSlot::Resolved if self.inconsistent.contains(&tree.id) => ThreadKind::Orphan,
            RootSlot::Resolved => ThreadKind::Resolved,
            _ => ThreadKind::GhostRoot,
        };
        ThreadEntry {
            id: tree.id,
            kind,
            head: match tree.root {
                RootSlot::Resolved => self.messages.get(&tree.id),
                _ => None,
            },
            replies: tree
                .replies()
                .filter_map(|node| self.messages.get(&node.id))
                .collect(),
        }
    }

    fn orphan_entry(&self, tree: &ThreadTree, head: &ReplyNode) -> Option<ThreadEntry<'_>> {
        Some(ThreadEntry {
            id: head.id,
            kind: ThreadKind::Orphan,
            head: Some(self.messages.get(&head.id)?),
            replies: tree
                .descendants(&head.id)
                .iter()
                .filter_map(|id| self.messages.get(id))
                .collect(),
        })
    }

    /// An orphan heads its own entry unless it sits under a resolved reply.
    fn heads_orphan_entry(tree: &ThreadTree, node: &ReplyNode) -> bool {
        match node.parent {
            ParentLink::Root => true,
            ParentLink::Node(parent) => tree.ghost(&parent).is_some(),
        }
    }
}

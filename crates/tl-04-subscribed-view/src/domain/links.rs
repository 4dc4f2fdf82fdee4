//! # View Links
//!
//! Owned rows handed out by the view. They copy what a reader needs so that
//! no board lock outlives the query.

use serde::{Deserialize, Serialize};
use shared_types::{BoardName, IdentityId, Message, MessageId, Timestamp};
use tl_02_board_index::ThreadKind;

/// One thread as a viewer sees it in one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardThreadLink {
    pub board: BoardName,
    /// Root id, ghost root id, or the id of the orphan heading the entry.
    pub thread_id: MessageId,
    pub kind: ThreadKindTag,
    /// The heading message, if stored and visible to the viewer.
    pub head: Option<Message>,
    /// Date of the most recent visible message in the thread.
    pub last_activity: Timestamp,
    pub visible_replies: usize,
}

impl BoardThreadLink {
    pub fn title(&self) -> Option<&str> {
        self.head.as_ref().map(|m| m.title.as_str())
    }

    pub fn is_ghost(&self) -> bool {
        self.kind == ThreadKindTag::GhostRoot
    }
}

/// Serializable mirror of [`ThreadKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadKindTag {
    Resolved,
    GhostRoot,
    Orphan,
}

impl From<ThreadKind> for ThreadKindTag {
    fn from(kind: ThreadKind) -> Self {
        match kind {
            ThreadKind::Resolved => ThreadKindTag::Resolved,
            ThreadKind::GhostRoot => ThreadKindTag::GhostRoot,
            ThreadKind::Orphan => ThreadKindTag::Orphan,
        }
    }
}

/// One visible reply inside a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardReplyLink {
    pub board: BoardName,
    pub thread_id: MessageId,
    pub message: Message,
}

impl BoardReplyLink {
    pub fn id(&self) -> MessageId {
        self.message.id
    }

    pub fn author(&self) -> IdentityId {
        self.message.author()
    }

    pub fn created(&self) -> Timestamp {
        self.message.created
    }
}

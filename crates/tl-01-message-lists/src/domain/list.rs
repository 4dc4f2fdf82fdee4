//! # Message List Entity

use serde::{Deserialize, Serialize};
use shared_types::{IdentityId, MessageId, MessageListId, MessageListReference, Timestamp};

/// One edition of an author's announcements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageList {
    pub id: MessageListId,
    pub references: Vec<MessageListReference>,
    pub received: Timestamp,
}

impl MessageList {
    pub fn new(id: MessageListId, references: Vec<MessageListReference>, received: Timestamp) -> Self {
        Self {
            id,
            references,
            received,
        }
    }

    pub fn author(&self) -> IdentityId {
        self.id.author
    }

    pub fn contains(&self, message_id: &MessageId) -> bool {
        self.references.iter().any(|r| r.message_id == *message_id)
    }

    /// True once every referenced message has been downloaded.
    pub fn is_complete(&self) -> bool {
        self.references.iter().all(|r| r.downloaded)
    }
}

//! # Message List Service
//!
//! Thread-safe access to the [`MessageListIndex`].

use crate::domain::errors::MessageListResult;
use crate::domain::index::{MessageListConfig, MessageListIndex, RemovedLists};
use crate::domain::list::MessageList;
use board_telemetry::VALIDATION_REJECTIONS;
use parking_lot::RwLock;
use shared_types::{IdentityId, MessageId, MessageListId, MessageListReference, Timestamp};
use tracing::{debug, info, warn};

/// Shared message list index.
pub struct MessageListService {
    index: RwLock<MessageListIndex>,
}

impl MessageListService {
    pub fn new(config: MessageListConfig) -> Self {
        Self {
            index: RwLock::new(MessageListIndex::new(config)),
        }
    }

    pub fn on_message_list_received(
        &self,
        list_id: MessageListId,
        references: Vec<MessageListReference>,
        received: Timestamp,
    ) -> MessageListResult<Vec<MessageId>> {
        let count = references.len();
        let result = self
            .index
            .write()
            .on_message_list_received(list_id, references, received);

        match &result {
            Ok(wanted) => debug!(
                list = %list_id,
                references = count,
                newly_wanted = wanted.len(),
                "Message list accepted"
            ),
            Err(e) => {
                VALIDATION_REJECTIONS.with_label_values(&["message_list"]).inc();
                warn!(list = %list_id, error = %e, "Message list rejected");
            }
        }
        result
    }

    pub fn mark_downloaded(&self, message_id: &MessageId) -> bool {
        self.index.write().mark_downloaded(message_id)
    }

    pub fn messages_to_fetch(&self) -> Vec<MessageListReference> {
        self.index.read().messages_to_fetch()
    }

    pub fn latest_edition(&self, author: &IdentityId) -> Option<u64> {
        self.index.read().latest_edition(author)
    }

    pub fn missing_editions(&self, author: &IdentityId) -> Vec<u64> {
        self.index.read().missing_editions(author)
    }

    pub fn count_for(&self, author: &IdentityId) -> (usize, usize) {
        self.index.read().count_for(author)
    }

    pub fn remove_author(&self, author: &IdentityId) -> RemovedLists {
        let removed = self.index.write().remove_author(author);
        if !removed.lists.is_empty() {
            info!(
                author = %author.short(),
                lists = removed.lists.len(),
                references = removed.references,
                "Removed message lists of deleted identity"
            );
        }
        removed
    }

    pub fn get(&self, id: &MessageListId) -> Option<MessageList> {
        self.index.read().get(id).cloned()
    }

    pub fn lists(&self) -> Vec<MessageList> {
        self.index.read().lists().cloned().collect()
    }

    pub fn restore(&self, lists: Vec<MessageList>) {
        let mut index = self.index.write();
        for list in lists {
            index.restore(list);
        }
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }
}

impl Default for MessageListService {
    fn default() -> Self {
        Self::new(MessageListConfig::default())
    }
}

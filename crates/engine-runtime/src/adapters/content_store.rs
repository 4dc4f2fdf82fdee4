//! In-process content store, used by tests and by the daemon when no
//! network store is configured.

use crate::ports::ContentStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{FetchError, Message, MessageId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct InMemoryContentStore {
    messages: RwLock<HashMap<MessageId, Message>>,
    /// Ids that fail with a transient error until cleared.
    flaky: RwLock<HashSet<MessageId>>,
    offline: RwLock<bool>,
    fetches: AtomicU64,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `message` available to fetches.
    pub fn insert(&self, message: Message) {
        self.messages.write().insert(message.id, message);
    }

    pub fn remove(&self, id: &MessageId) -> Option<Message> {
        self.messages.write().remove(id)
    }

    pub fn set_flaky(&self, id: MessageId, flaky: bool) {
        let mut set = self.flaky.write();
        if flaky {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }

    /// While offline, publishing fails transiently.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.write() = offline;
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.read().contains_key(id)
    }

    /// Number of fetch calls served so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn fetch(&self, id: &MessageId) -> Result<Message, FetchError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        if self.flaky.read().contains(id) {
            return Err(FetchError::Transient(format!("{id} timed out")));
        }
        self.messages
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }

    async fn publish(&self, message: &Message) -> Result<String, FetchError> {
        if *self.offline.read() {
            return Err(FetchError::Transient("content store offline".into()));
        }
        self.insert(message.clone());
        Ok(format!("mem:{}", message.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{BoardName, IdentityId};
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn test_fetch_and_publish() {
        let store = InMemoryContentStore::new();
        let message = Message::new_thread(
            MessageId::generate(IdentityId([3; 32])),
            "t",
            "b",
            1,
            BTreeSet::from([BoardName::new("en.test").unwrap()]),
        );

        assert!(matches!(store.fetch(&message.id).await, Err(FetchError::NotFound(_))));

        store.set_offline(true);
        assert!(store.publish(&message).await.is_err());
        store.set_offline(false);
        let location = store.publish(&message).await.unwrap();
        assert!(location.starts_with("mem:"));
        assert_eq!(store.fetch(&message.id).await.unwrap(), message);

        store.set_flaky(message.id, true);
        assert!(matches!(store.fetch(&message.id).await, Err(FetchError::Transient(_))));
        assert_eq!(store.fetch_count(), 3);
    }
}

//! # Own-Message Outbox
//!
//! Messages authored locally wait here until the content store accepts them.
//!
//! ```text
//! [QUEUED] ──publish ok──→ [PUBLISHED]
//!    │  ↑
//!    │  └── publish failed (attempts += 1)
//!    └──── unsend ──→ removed
//! ```
//!
//! A published message can no longer be unsent.

use super::{ArrivalReport, BoardEngine, EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use shared_types::{validate_message, IdentityId, Message, MessageId, Timestamp};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxState {
    Queued,
    Published { location: String, at: Timestamp },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub message: Message,
    pub queued_at: Timestamp,
    pub state: OutboxState,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl OutboxEntry {
    pub fn is_published(&self) -> bool {
        matches!(self.state, OutboxState::Published { .. })
    }
}

/// Own messages keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbox {
    entries: BTreeMap<MessageId, OutboxEntry>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message. Returns false if it was already known.
    pub fn queue(&mut self, message: Message, now: Timestamp) -> bool {
        if self.entries.contains_key(&message.id) {
            return false;
        }
        self.entries.insert(
            message.id,
            OutboxEntry {
                message,
                queued_at: now,
                state: OutboxState::Queued,
                attempts: 0,
                last_error: None,
            },
        );
        true
    }

    /// Queued messages, oldest first.
    pub fn pending(&self) -> Vec<Message> {
        let mut pending: Vec<&OutboxEntry> = self.entries.values().filter(|e| !e.is_published()).collect();
        pending.sort_by_key(|e| (e.queued_at, e.message.id));
        pending.into_iter().map(|e| e.message.clone()).collect()
    }

    pub fn mark_published(&mut self, id: &MessageId, location: String, now: Timestamp) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) if !entry.is_published() => {
                entry.attempts += 1;
                entry.last_error = None;
                entry.state = OutboxState::Published { location, at: now };
                true
            }
            _ => false,
        }
    }

    pub fn mark_failed(&mut self, id: &MessageId, error: String) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) if !entry.is_published() => {
                entry.attempts += 1;
                entry.last_error = Some(error);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: &MessageId) -> Option<&OutboxEntry> {
        self.entries.get(id)
    }

    pub fn remove(&mut self, id: &MessageId) -> Option<OutboxEntry> {
        self.entries.remove(id)
    }

    /// Drop every entry authored by `author`.
    pub fn remove_author(&mut self, author: &IdentityId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| id.author != *author);
        before - self.entries.len()
    }

    pub fn count_for(&self, author: &IdentityId) -> usize {
        self.entries.keys().filter(|id| id.author == *author).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BoardEngine {
    /// Queue a locally authored message and show it in its boards at once.
    pub fn queue_own_message(&self, message: Message) -> EngineResult<ArrivalReport> {
        let author = message.author();
        if self.is_deleted(&author) {
            return Err(EngineError::DeletedIdentity(author));
        }
        validate_message(&message, Some(author), &self.config.validation)?;

        let id = message.id;
        self.outbox.write().queue(message.clone(), self.now());
        let report = self.on_message_received(message, Some(author))?;
        info!(message_id = %id, "Own message queued");
        Ok(report)
    }

    /// Withdraw a queued message that has not been published yet.
    ///
    /// Replies already made to it locally stay, under a ghost.
    pub fn unsend(&self, id: &MessageId) -> EngineResult<()> {
        {
            let mut outbox = self.outbox.write();
            match outbox.get(id) {
                None => return Err(EngineError::NotQueued(*id)),
                Some(entry) if entry.is_published() => return Err(EngineError::AlreadyPublished(*id)),
                Some(_) => {}
            }
            outbox.remove(id);
        }

        for (_, handle) in self.board_handles() {
            handle.write().remove_message(id, false);
        }
        info!(message_id = %id, "Own message unsent");
        Ok(())
    }

    pub fn pending_own_messages(&self) -> Vec<Message> {
        self.outbox.read().pending()
    }

    pub fn mark_published(&self, id: &MessageId, location: String) -> bool {
        let published = self.outbox.write().mark_published(id, location, self.now());
        if published {
            info!(message_id = %id, "Own message published");
        }
        published
    }

    pub fn mark_publish_failed(&self, id: &MessageId, error: String) -> bool {
        warn!(message_id = %id, error = %error, "Publishing own message failed");
        self.outbox.write().mark_failed(id, error)
    }

    pub fn outbox_entry(&self, id: &MessageId) -> Option<OutboxEntry> {
        self.outbox.read().get(id).cloned()
    }
}

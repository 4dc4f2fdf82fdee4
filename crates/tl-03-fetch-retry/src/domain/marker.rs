//! # Fetch Failed Markers

use serde::{Deserialize, Serialize};
use shared_types::{FetchReason, IdentityId, MessageId, MessageListId, Timestamp};
use std::fmt;

/// What a failed fetch was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FetchSubject {
    Message(MessageId),
    MessageList(MessageListId),
}

impl FetchSubject {
    /// Identity that authored the subject.
    pub fn author(&self) -> IdentityId {
        match self {
            FetchSubject::Message(id) => id.author,
            FetchSubject::MessageList(id) => id.author,
        }
    }

    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchSubject::Message(_) => "message",
            FetchSubject::MessageList(_) => "message_list",
        }
    }
}

impl fmt::Display for FetchSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchSubject::Message(id) => write!(f, "message {id}"),
            FetchSubject::MessageList(id) => write!(f, "message list {id}"),
        }
    }
}

/// Failure record for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailedMarker {
    pub subject: FetchSubject,
    pub reason: FetchReason,
    /// Repeated failures after the first one.
    pub retry_count: u32,
    pub first_failure: Timestamp,
    pub last_attempt: Timestamp,
    pub next_retry: Timestamp,
    /// Set once the marker has been reported as due.
    pub retry_reported: bool,
}

impl FetchFailedMarker {
    pub(crate) fn new(subject: FetchSubject, reason: FetchReason, now: Timestamp, delay: u64) -> Self {
        Self {
            subject,
            reason,
            retry_count: 0,
            first_failure: now,
            last_attempt: now,
            next_retry: now.saturating_add(delay),
            retry_reported: false,
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        now >= self.next_retry
    }

    pub fn is_stale(&self, now: Timestamp, ttl: u64) -> bool {
        now.saturating_sub(self.last_attempt) > ttl
    }
}

pub fn reason_label(reason: FetchReason) -> &'static str {
    match reason {
        FetchReason::NotFound => "not_found",
        FetchReason::Transient => "transient",
    }
}

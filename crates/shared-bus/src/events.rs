//! # Board Events
//!
//! Defines every event that flows through the shared bus.
//!
//! Arrival events are published by the network side (content store
//! callbacks, identity manager) and consumed by the engine's event router.
//! Notification events are published by the engine after a board changed.

use serde::{Deserialize, Serialize};
use shared_types::entities::{
    BoardName, IdentityId, Message, MessageId, MessageListId, MessageListReference, Timestamp,
};
use shared_types::errors::FetchReason;

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BoardEvent {
    // =========================================================================
    // CONTENT STORE: ARRIVALS
    // =========================================================================
    /// A message body was downloaded.
    MessageReceived {
        message: Message,
        /// The announcing identity, when known; validated against the id.
        announced_by: Option<IdentityId>,
    },

    /// A message list (announcement batch) was downloaded.
    MessageListReceived {
        list_id: MessageListId,
        references: Vec<MessageListReference>,
        received: Timestamp,
    },

    // =========================================================================
    // CONTENT STORE: FAILURES
    // =========================================================================
    /// Fetching a message failed.
    MessageFetchFailed {
        message_id: MessageId,
        reason: FetchReason,
    },

    /// Fetching a message list failed.
    MessageListFetchFailed {
        list_id: MessageListId,
        reason: FetchReason,
    },

    // =========================================================================
    // IDENTITY MANAGER
    // =========================================================================
    /// An identity is being deleted; all its content must go.
    IdentityDeleted { identity: IdentityId },

    // =========================================================================
    // ENGINE NOTIFICATIONS
    // =========================================================================
    /// A board's graph changed.
    BoardUpdated {
        board: BoardName,
        message_id: MessageId,
    },

    /// A previously missing message now fills its place in a thread.
    GhostResolved {
        board: BoardName,
        message_id: MessageId,
    },
}

impl BoardEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::MessageReceived { .. } | Self::MessageListReceived { .. } => EventTopic::Arrivals,
            Self::MessageFetchFailed { .. } | Self::MessageListFetchFailed { .. } => {
                EventTopic::FetchFailures
            }
            Self::IdentityDeleted { .. } => EventTopic::Identities,
            Self::BoardUpdated { .. } | Self::GhostResolved { .. } => EventTopic::Notifications,
        }
    }

    /// Get the originating component.
    #[must_use]
    pub fn source(&self) -> EventSource {
        match self {
            Self::MessageReceived { .. }
            | Self::MessageListReceived { .. }
            | Self::MessageFetchFailed { .. }
            | Self::MessageListFetchFailed { .. } => EventSource::ContentStore,
            Self::IdentityDeleted { .. } => EventSource::IdentityManager,
            Self::BoardUpdated { .. } | Self::GhostResolved { .. } => EventSource::Engine,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Messages and message lists arriving.
    Arrivals,
    /// Failed fetches feeding the retry tracker.
    FetchFailures,
    /// Identity lifecycle.
    Identities,
    /// Engine-side change notifications.
    Notifications,
    /// All events (no filtering).
    All,
}

/// Components that publish onto the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    ContentStore,
    IdentityManager,
    Engine,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Sources to include. Empty means all sources.
    pub sources: Vec<EventSource>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            sources: Vec::new(),
        }
    }

    /// Create a filter for events from specific sources.
    #[must_use]
    pub fn from_sources(sources: Vec<EventSource>) -> Self {
        Self {
            topics: Vec::new(),
            sources,
        }
    }

    /// Everything the engine consumes: arrivals, failures and identity changes.
    #[must_use]
    pub fn engine_inputs() -> Self {
        Self::topics(vec![
            EventTopic::Arrivals,
            EventTopic::FetchFailures,
            EventTopic::Identities,
        ])
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &BoardEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.sources.is_empty() || self.sources.contains(&event.source());

        topic_match && source_match
    }
}

//! # Outbound Ports
//!
//! The anonymizing content store the engine fetches from and publishes to.
//! Implementations live outside the engine; calls are never made while a
//! board lock is held.

use async_trait::async_trait;
use shared_types::{FetchError, Message, MessageId};

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Download the message stored under `id`.
    async fn fetch(&self, id: &MessageId) -> Result<Message, FetchError>;

    /// Insert an own message; returns the location it was stored at.
    async fn publish(&self, message: &Message) -> Result<String, FetchError>;
}

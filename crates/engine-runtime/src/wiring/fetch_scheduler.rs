//! # Fetch Scheduler
//!
//! Periodically asks the engine what it is missing, fetches it from the
//! content store and publishes the outcome on the bus. The same pass pushes
//! queued own messages to the store.
//!
//! The scheduler never touches board graphs directly: arrivals reach the
//! engine through the event router like any other producer's.

use crate::engine::BoardEngine;
use crate::ports::ContentStore;
use shared_bus::{BoardEvent, EventPublisher, InMemoryEventBus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Counters for one scheduler pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPass {
    /// Markers that became due during the sweep.
    pub due: usize,
    pub purged: usize,
    pub requested: usize,
    pub fetched: usize,
    pub failed: usize,
    /// Fetched content that failed validation or did not match its id.
    pub rejected: usize,
    pub published: usize,
    pub publish_failed: usize,
}

pub struct FetchScheduler {
    engine: Arc<BoardEngine>,
    store: Arc<dyn ContentStore>,
    bus: Arc<InMemoryEventBus>,
    batch: usize,
}

impl FetchScheduler {
    pub fn new(engine: Arc<BoardEngine>, store: Arc<dyn ContentStore>, bus: Arc<InMemoryEventBus>) -> Self {
        let batch = engine.config().fetch_batch.max(1);
        Self {
            engine,
            store,
            bus,
            batch,
        }
    }

    pub async fn run_pass(&self) -> FetchPass {
        let sweep = self.engine.clear_expired_fetch_failed_markers();
        let mut pass = FetchPass {
            due: sweep.eligible.len(),
            purged: sweep.purged.len(),
            ..FetchPass::default()
        };

        let wanted = self.engine.messages_to_fetch();
        for id in wanted.into_iter().take(self.batch) {
            pass.requested += 1;
            match self.store.fetch(&id).await {
                Ok(message) if message.id == id => {
                    pass.fetched += 1;
                    self.bus
                        .publish(BoardEvent::MessageReceived {
                            message,
                            announced_by: Some(id.author),
                        })
                        .await;
                }
                Ok(message) => {
                    pass.rejected += 1;
                    warn!(message_id = %id, returned = %message.id, "Content store returned a different message");
                    self.engine.discard_invalid(&id);
                }
                Err(e) => match e.reason() {
                    Some(reason) => {
                        pass.failed += 1;
                        self.bus
                            .publish(BoardEvent::MessageFetchFailed { message_id: id, reason })
                            .await;
                    }
                    None => {
                        pass.rejected += 1;
                        warn!(message_id = %id, error = %e, "Fetched content rejected");
                        self.engine.discard_invalid(&id);
                    }
                },
            }
        }

        for message in self.engine.pending_own_messages() {
            match self.store.publish(&message).await {
                Ok(location) => {
                    if self.engine.mark_published(&message.id, location) {
                        pass.published += 1;
                    }
                }
                Err(e) => {
                    pass.publish_failed += 1;
                    self.engine.mark_publish_failed(&message.id, e.to_string());
                }
            }
        }

        if pass != FetchPass::default() {
            debug!(
                requested = pass.requested,
                fetched = pass.fetched,
                failed = pass.failed,
                published = pass.published,
                "Fetch pass finished"
            );
        }
        pass
    }

    /// Run a pass every `interval`, or sooner when `wake` is notified.
    pub async fn run(self, interval: Duration, wake: Arc<Notify>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs(), batch = self.batch, "Fetch scheduler started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Fetch scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {}
                _ = wake.notified() => {}
            }
            self.run_pass().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryContentStore;
    use crate::config::EngineConfig;
    use shared_bus::EventFilter;
    use shared_types::{BoardName, IdentityId, Message, MessageId, MessageListId, MessageListReference};
    use std::collections::BTreeSet;

    fn board() -> BoardName {
        BoardName::new("en.test").unwrap()
    }

    fn thread(author: u8) -> Message {
        Message::new_thread(
            MessageId::generate(IdentityId([author; 32])),
            "title",
            "body",
            10,
            BTreeSet::from([board()]),
        )
    }

    #[tokio::test]
    async fn test_pass_fetches_announced_messages() {
        let engine = Arc::new(BoardEngine::with_defaults(EngineConfig::default()));
        let store = Arc::new(InMemoryContentStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let mut events = bus.subscribe(EventFilter::engine_inputs());

        let present = thread(1);
        let missing = MessageId::generate(IdentityId([1; 32]));
        store.insert(present.clone());

        let list = MessageListId::new(IdentityId([1; 32]), 0);
        engine
            .on_message_list_received(
                list,
                vec![
                    MessageListReference::new(present.id, board(), 5),
                    MessageListReference::new(missing, board(), 6),
                ],
                7,
            )
            .unwrap();

        let scheduler = FetchScheduler::new(Arc::clone(&engine), store, bus);
        let pass = scheduler.run_pass().await;
        assert_eq!(pass.requested, 2);
        assert_eq!(pass.fetched, 1);
        assert_eq!(pass.failed, 1);

        let mut received = Vec::new();
        while let Ok(Some(event)) = events.try_recv() {
            received.push(event);
        }
        assert!(received
            .iter()
            .any(|e| matches!(e, BoardEvent::MessageReceived { message, .. } if message.id == present.id)));
        assert!(received
            .iter()
            .any(|e| matches!(e, BoardEvent::MessageFetchFailed { message_id, .. } if *message_id == missing)));
    }

    #[tokio::test]
    async fn test_pass_publishes_outbox() {
        let engine = Arc::new(BoardEngine::with_defaults(EngineConfig::default()));
        let store = Arc::new(InMemoryContentStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let own = thread(7);
        engine.queue_own_message(own.clone()).unwrap();

        let scheduler = FetchScheduler::new(Arc::clone(&engine), store.clone(), bus);
        store.set_offline(true);
        assert_eq!(scheduler.run_pass().await.publish_failed, 1);
        let entry = engine.outbox_entry(&own.id).unwrap();
        assert_eq!(entry.attempts, 1);
        assert!(entry.last_error.is_some());

        store.set_offline(false);
        assert_eq!(scheduler.run_pass().await.published, 1);
        assert!(store.contains(&own.id));
        assert!(engine.pending_own_messages().is_empty());
    }
}

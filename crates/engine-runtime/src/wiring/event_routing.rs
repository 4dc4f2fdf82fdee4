//! # Event Router
//!
//! Applies bus events to the engine, one at a time, and publishes the
//! resulting notifications.
//!
//! | Event | Engine call |
//! |-------|-------------|
//! | `MessageReceived` | `on_message_received` |
//! | `MessageListReceived` | `on_message_list_received` |
//! | `MessageFetchFailed` | `on_message_fetch_failed` |
//! | `MessageListFetchFailed` | `on_message_list_fetch_failed` |
//! | `IdentityDeleted` | `on_identity_deletion` |
//!
//! A lagging router loses events. Lost arrivals are recovered by waking the
//! fetch scheduler: anything not stored is still listed by
//! `messages_to_fetch`.

use crate::engine::{BoardEngine, EngineError};
use board_telemetry::{metric_inc, EVENT_BUS_LAGGED};
use shared_bus::{BoardEvent, EventPublisher, InMemoryEventBus, Subscription, SubscriptionError};
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tracing::{debug, info, warn};

pub struct EventRouter {
    engine: Arc<BoardEngine>,
    bus: Arc<InMemoryEventBus>,
    resync: Arc<Notify>,
}

impl EventRouter {
    pub fn new(engine: Arc<BoardEngine>, bus: Arc<InMemoryEventBus>, resync: Arc<Notify>) -> Self {
        Self { engine, bus, resync }
    }

    /// Apply one event and return the notifications it produced.
    pub fn apply(&self, event: BoardEvent) -> Vec<BoardEvent> {
        match event {
            BoardEvent::MessageReceived { message, announced_by } => {
                let id = message.id;
                match self.engine.on_message_received(message, announced_by) {
                    Ok(report) => report.notifications(),
                    Err(EngineError::DeletedIdentity(_)) => Vec::new(),
                    Err(e) => {
                        debug!(message_id = %id, error = %e, "Arrival not applied");
                        Vec::new()
                    }
                }
            }
            BoardEvent::MessageListReceived {
                list_id,
                references,
                received,
            } => {
                match self.engine.on_message_list_received(list_id, references, received) {
                    Ok(wanted) if !wanted.is_empty() => self.resync.notify_one(),
                    Ok(_) => {}
                    Err(e) => debug!(list = %list_id, error = %e, "Message list not applied"),
                }
                Vec::new()
            }
            BoardEvent::MessageFetchFailed { message_id, reason } => {
                self.engine.on_message_fetch_failed(message_id, reason);
                Vec::new()
            }
            BoardEvent::MessageListFetchFailed { list_id, reason } => {
                self.engine.on_message_list_fetch_failed(list_id, reason);
                Vec::new()
            }
            BoardEvent::IdentityDeleted { identity } => {
                let report = self.engine.on_identity_deletion(&identity);
                report
                    .boards
                    .iter()
                    .filter_map(|(board, removal)| {
                        removal.removed.first().map(|id| BoardEvent::BoardUpdated {
                            board: board.clone(),
                            message_id: *id,
                        })
                    })
                    .collect()
            }
            BoardEvent::BoardUpdated { .. } | BoardEvent::GhostResolved { .. } => Vec::new(),
        }
    }

    /// Route events until shutdown or until the bus closes.
    pub async fn run(self, mut subscription: Subscription, mut shutdown: watch::Receiver<bool>) {
        info!("Event router started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Event router shutting down");
                    break;
                }
                received = subscription.recv() => match received {
                    Ok(event) => {
                        for notification in self.apply(event) {
                            self.bus.publish(notification).await;
                        }
                    }
                    Err(SubscriptionError::Lagged(dropped)) => {
                        metric_inc!(EVENT_BUS_LAGGED);
                        warn!(dropped, "Event router lagged, scheduling a refetch");
                        self.resync.notify_one();
                    }
                    Err(SubscriptionError::Closed) => {
                        info!("Event bus closed, router exiting");
                        break;
                    }
                },
            }
        }
    }
}

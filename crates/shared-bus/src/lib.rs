//! # Shared Bus - Event Bus for Board Arrivals
//!
//! Producers (content store callbacks, the identity manager) publish arrival
//! events; the engine's event router consumes them and publishes change
//! notifications back.
//!
//! ```text
//! ┌───────────────┐   publish()   ┌──────────────┐  subscribe()  ┌──────────────┐
//! │ Content Store │ ────────────▶ │  Event Bus   │ ────────────▶ │ Event Router │
//! └───────────────┘               └──────────────┘               └──────────────┘
//!                                        ▲                              │
//!                                        └──────── BoardUpdated ────────┘
//! ```
//!
//! ## Delivery
//!
//! - No ordering guarantee across producers; the engine is order-independent.
//! - Slow subscribers observe `SubscriptionError::Lagged` and resynchronise.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{BoardEvent, EventFilter, EventSource, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lag.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

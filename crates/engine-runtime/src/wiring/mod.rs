//! # Wiring
//!
//! Connects the engine to the shared bus and the content store.
//!
//! ```text
//! ContentStore ──fetch──→ FetchScheduler ──MessageReceived / *FetchFailed──→ Event Bus
//!                                                                               │
//!          BoardUpdated / GhostResolved ←── EventRouter ←── engine inputs ──────┘
//! ```

pub mod event_routing;
pub mod fetch_scheduler;

pub use event_routing::EventRouter;
pub use fetch_scheduler::{FetchPass, FetchScheduler};

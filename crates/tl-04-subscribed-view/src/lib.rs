//! # Subscribed View (tl-04)
//!
//! Read-only, per-viewer projections of a board's thread forest. Nothing in
//! this crate mutates the board index; every query recomputes its listing
//! from the board graph it is handed.
//!
//! ## Visibility
//!
//! | Item | Shown when |
//! |------|------------|
//! | thread | at least one of its messages has an author the viewer wants |
//! | reply | its author is wanted, and it sits in the thread in this board |
//! | own message | always |
//!
//! ## Ordering
//!
//! - Threads: most recent visible message first, ties by ascending id.
//! - Replies: oldest first, ties by ascending id.
//!
//! ## Crate Structure
//!
//! - `domain/` - subscriptions, link types, listings, projections
//! - `ports/` - the trust oracle
//! - `service.rs` - subscription-checked, thread-safe entry point

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::errors::{ViewError, ViewResult};
pub use domain::links::{BoardReplyLink, BoardThreadLink, ThreadKindTag};
pub use domain::listing::Listing;
pub use domain::projection::{project_replies, project_threads, visible_message_count};
pub use domain::subscriptions::Subscriptions;
pub use ports::outbound::{StaticTrustOracle, TrustEveryone, TrustOracle};
pub use service::SubscribedView;

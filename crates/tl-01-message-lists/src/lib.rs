//! # Message List Index (tl-01)
//!
//! Tracks which messages every author has announced. Each author publishes
//! numbered editions of message lists; each list references messages by id
//! together with the board they were posted to.
//!
//! ## Responsibilities
//!
//! - Deduplicate lists by `(author, edition)`
//! - Reject lists that reference foreign messages or invalid boards
//! - Derive the set of messages still to download
//! - Report edition gaps so missing lists can be fetched
//!
//! ## Crate Structure
//!
//! - `domain/` - lists, index, errors
//! - `service.rs` - thread-safe wrapper with logging and metrics

pub mod domain;
pub mod service;

pub use domain::errors::{MessageListError, MessageListResult};
pub use domain::index::{MessageListConfig, MessageListIndex, RemovedLists};
pub use domain::list::MessageList;
pub use service::MessageListService;

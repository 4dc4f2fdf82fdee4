//! # Fetch Retry Tracker (tl-03)
//!
//! Remembers which message and message-list fetches failed and decides when
//! they may be retried.
//!
//! ## Backoff Schedule
//!
//! | Failure | Retry count | Next retry |
//! |---------|-------------|------------|
//! | first | 0 | `now + min_delay` |
//! | n-th repeat | n | `now + min(min_delay * 2^n, max_delay)` |
//!
//! Markers are deleted on success, on TTL expiry (`marker_ttl_secs` after
//! the last attempt) or when their subject is deleted by an identity
//! deletion cascade.
//!
//! ## Crate Structure
//!
//! - `domain/` - markers, configuration and the pure tracker
//! - `ports/` - time source
//! - `service.rs` - thread-safe wrapper with logging and metrics

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::config::RetryConfig;
pub use domain::marker::{FetchFailedMarker, FetchSubject};
pub use domain::tracker::{ClearReport, FetchRetryTracker};
pub use ports::outbound::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use service::FetchRetryService;

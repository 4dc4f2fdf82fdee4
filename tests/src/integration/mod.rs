//! Cross-crate integration tests.

mod concurrency;
mod deletion_cascade;
mod order_independence;
mod scenarios;

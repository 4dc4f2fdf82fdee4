//! Domain layer for fetch retry tracking.

pub mod config;
pub mod marker;
pub mod tracker;

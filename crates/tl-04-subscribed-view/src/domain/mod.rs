//! Domain layer for the subscribed view.

pub mod errors;
pub mod links;
pub mod listing;
pub mod projection;
pub mod subscriptions;

//! Ports for the subscribed view.

pub mod outbound;

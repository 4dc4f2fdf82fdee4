//! Ports to the outside world.

pub mod outbound;

pub use outbound::ContentStore;

//! Adapters implementing the outbound ports.

pub mod content_store;

pub use content_store::InMemoryContentStore;

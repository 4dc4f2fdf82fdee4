//! Domain layer for the message list index.

pub mod errors;
pub mod index;
pub mod list;

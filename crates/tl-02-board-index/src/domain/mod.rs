//! Domain layer for the board index.

pub mod errors;
pub mod graph;
pub mod report;
pub mod slots;

//! # Shared Types Crate
//!
//! This crate contains the domain entities and structural validation shared
//! by every subsystem of the board engine.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Immutable Messages**: A `Message` never changes after publication; the
//!   engine only learns more about the links around it.
//! - **Validate at the Edge**: `validate_message` runs before anything is
//!   stored. Rejected input never enters a board graph.

pub mod entities;
pub mod errors;
pub mod validation;

pub use entities::*;
pub use errors::*;
pub use validation::{validate_board_name, validate_message, validate_text, ValidationLimits};

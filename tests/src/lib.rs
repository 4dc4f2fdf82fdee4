//! # Threadloom Test Suite
//!
//! Cross-crate tests driving the engine the way collaborators do.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Message builders and random forests
//! └── integration/
//!     ├── scenarios.rs          # Worked delivery and deletion examples
//!     ├── order_independence.rs # Any arrival order, same boards
//!     ├── deletion_cascade.rs   # Identity deletion keeps replies reachable
//!     └── concurrency.rs        # Parallel producers, bus wiring
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tl-tests
//! cargo test -p tl-tests integration::order_independence
//! cargo bench -p tl-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;

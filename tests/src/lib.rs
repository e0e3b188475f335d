//! # Tonlib Pool Test Suite
//!
//! Cross-component flows: `TonlibClient` over a real `WorkerPool` whose
//! workers drive mock engine sessions.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs           # Mock engine answers and sample BOCs
//! └── integration/
//!     ├── flows.rs          # Gateway-facing operations end to end
//!     └── lifecycle.rs      # Worker exclusivity, recycling, deadlines
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tonlib-pool-tests
//! cargo test -p tonlib-pool-tests integration::lifecycle::
//! ```

pub mod fixtures;
pub mod integration;

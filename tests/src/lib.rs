//! # Vote Relay Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs      # Relay on a temp dir, in-memory client
//! ├── integration/     # Protocol → forwarding → cache → replay
//! └── adversarial/     # Hostile and broken clients
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vr-tests
//! cargo test -p vr-tests integration::
//! cargo test -p vr-tests adversarial::
//! ```

pub mod adversarial;
#[cfg(test)]
pub mod fixtures;
pub mod integration;

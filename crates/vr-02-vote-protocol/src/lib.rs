//! # Vote Protocol Subsystem (vr-02)
//!
//! Turns the bytes a vote-listing site sends into an authenticated [`Vote`].
//!
//! ## Protocols
//!
//! | Version | Framing | Authentication | Acknowledgement |
//! |---------|---------|----------------|-----------------|
//! | `LegacyEncrypted` | one RSA block (key modulus size) | RSA PKCS#1 v1.5 decryption | none |
//! | `TokenAuthenticated` | `0x733A` magic, u16 length, JSON | HMAC-SHA256 with named token + challenge | `{"status":..}\r\n` |
//!
//! ## Session Lifecycle
//!
//! ```text
//! [AwaitingHandshake] ──→ [AwaitingAuth] ──→ [Negotiated(version)] ──→ [Closed]
//! ```
//!
//! Every decode failure is classified (see [`DecodeFailureKind`]) and closes
//! the session. Nothing is resynchronized after a bad frame.
//!
//! ## Outbound Dependencies
//!
//! | Dependency | Trait | Purpose |
//! |------------|-------|---------|
//! | Host | `VoteReceiver` | Receives decoded votes |
//! | Key Store (1) | `KeyStoreHandle` | Snapshot of keys per decode |
//!
//! [`Vote`]: shared_types::Vote

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{handle_connection, ConnectionSettings};
pub use domain::*;
pub use ports::VoteReceiver;
pub use service::VoteCodec;

//! # Key Store Subsystem (vr-01)
//!
//! Holds the RSA key pair used to decrypt legacy-protocol votes and the named
//! shared-secret tokens used to authenticate token-protocol votes.
//!
//! ## Architecture Role
//!
//! ```text
//! [key files] ──load_or_generate──→ [KeyStore] ──KeyStoreHandle──→ [Vote Protocol (2)]
//!                                        ↑
//!                        operator rotation (replace)
//! ```
//!
//! The store is read-only once built. Rotation swaps a whole new store in
//! through [`KeyStoreHandle::replace`].

pub mod adapters;
pub mod domain;
pub mod service;

pub use domain::*;
pub use service::KeyStoreHandle;

//! # Shared Types Crate
//!
//! This crate contains the vote entity, the protocol generation tag and the
//! forwarding wire encoding used by every subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Vote` is defined once and passed by value.
//! - **Opaque Identities**: server and player identities are plain strings,
//!   separated only by [`CacheKey`].

pub mod entities;
pub mod errors;
pub mod wire;

pub use entities::*;
pub use errors::*;
pub use wire::{decode_batch, encode_batch, encode_vote};

//! Ports for the Vote Protocol subsystem.

pub mod outbound;

pub use outbound::*;

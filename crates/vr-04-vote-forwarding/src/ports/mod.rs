//! Ports for the Vote Forwarding subsystem.

pub mod outbound;

pub use outbound::*;

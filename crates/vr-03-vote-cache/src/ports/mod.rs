//! Ports for the Vote Cache subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;

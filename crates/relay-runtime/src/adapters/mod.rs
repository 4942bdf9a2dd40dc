//! # Runtime Adapters
//!
//! Implementations of subsystem ports that live at the runtime level.

pub mod receiver;

pub use receiver::ForwardingReceiver;

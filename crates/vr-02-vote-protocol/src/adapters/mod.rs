//! Stream adapters for the Vote Protocol subsystem.

pub mod connection;

pub use connection::{handle_connection, ConnectionSettings};

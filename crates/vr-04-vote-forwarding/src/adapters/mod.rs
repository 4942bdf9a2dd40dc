//! Adapters for the Vote Forwarding subsystem.

pub mod tokio_scheduler;

pub use tokio_scheduler::TokioScheduler;

//! # Driven Ports (Outbound SPI)
//!
//! What forwarding needs from the host: the backend registry with its
//! transport, and a timer.

use std::time::Duration;

/// Registry of backend consumers and the transport to reach them.
///
/// # Thread Safety
///
/// Called from connection tasks and scheduled replay tasks concurrently.
pub trait ConsumerNetwork: Send + Sync {
    /// Names of the backend servers currently known. May change over time.
    fn known_consumers(&self) -> Vec<String>;

    /// Best-effort delivery of `data` to `consumer`.
    ///
    /// Returns `false` when the consumer is unreachable; must not panic for
    /// ordinary unreachability.
    fn send_to_consumer(&self, consumer: &str, data: &[u8]) -> bool;
}

/// Work handed to a [`Scheduler`].
pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// Non-blocking timer.
pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay`, without blocking the caller.
    ///
    /// If the scheduler shuts down first, the task is dropped unrun.
    fn schedule_after(&self, delay: Duration, task: ScheduledTask);
}

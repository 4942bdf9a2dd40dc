//! # Tokio Scheduler
//!
//! [`Scheduler`] backed by a tokio runtime. Each task is a spawned future
//! that sleeps and then runs the task on the runtime.

use crate::ports::{ScheduledTask, Scheduler};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler on the runtime the caller is running in, if any.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: ScheduledTask) {
        trace!(?delay, "Scheduling replay task");
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

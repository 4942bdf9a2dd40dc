//! # Drain State Machine
//!
//! One replay of a held queue to one target, advanced one chunk per
//! scheduled attempt:
//!
//! ```text
//! [Idle] ──start──→ queue empty ──────────────────────────────→ [Done]
//!   │
//!   └──start──→ [Scheduling] ──take_chunk──→ [Draining] ──record──┬─→ [Done]
//!                    ↑                                            │
//!                    └──── full chunk delivered, votes remain ────┘
//! ```
//!
//! The first attempt waits the initial cool-down, later ones the retry
//! cool-down. A chunk that fails to deliver goes back to the front of the
//! queue in its original order and the drain stops.

use shared_types::Vote;
use std::collections::VecDeque;
use std::time::Duration;

/// Cool-downs between drain attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainSchedule {
    /// Wait before the first chunk.
    pub initial_delay: Duration,
    /// Wait before every following chunk.
    pub retry_delay: Duration,
}

impl Default for DrainSchedule {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Where a drain is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    Idle,
    Scheduling,
    Draining,
    Done,
}

/// How a drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Every chunk attempted was delivered.
    Completed,
    /// A chunk failed and was put back.
    ChunkFailed,
    /// The drain was dropped before finishing, e.g. at shutdown.
    Interrupted,
}

/// Result of a drain, handed to its completion callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Votes delivered across all chunks.
    pub evicted: usize,
    /// Votes still undelivered, in queue order.
    pub remaining: VecDeque<Vote>,
    pub status: DrainStatus,
}

/// What the driver must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainStep {
    /// Run the next attempt after this delay.
    Schedule(Duration),
    /// The drain is over.
    Complete(DrainOutcome),
}

/// State of one drain invocation.
#[derive(Debug)]
pub struct DrainJob {
    queue: VecDeque<Vote>,
    dump_rate: usize,
    schedule: DrainSchedule,
    evicted: usize,
    state: DrainState,
}

impl DrainJob {
    /// `dump_rate` is clamped to at least one vote per chunk.
    pub fn new(queue: VecDeque<Vote>, dump_rate: usize, schedule: DrainSchedule) -> Self {
        Self {
            queue,
            dump_rate: dump_rate.max(1),
            schedule,
            evicted: 0,
            state: DrainState::Idle,
        }
    }

    pub fn state(&self) -> DrainState {
        self.state
    }

    pub fn evicted(&self) -> usize {
        self.evicted
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Leave `Idle`.
    pub fn start(&mut self) -> DrainStep {
        debug_assert_eq!(self.state, DrainState::Idle);
        if self.queue.is_empty() {
            return self.finish(DrainStatus::Completed);
        }
        self.state = DrainState::Scheduling;
        DrainStep::Schedule(self.schedule.initial_delay)
    }

    /// Remove up to `dump_rate` votes from the front for the next attempt.
    pub fn take_chunk(&mut self) -> Vec<Vote> {
        debug_assert_eq!(self.state, DrainState::Scheduling);
        self.state = DrainState::Draining;
        let n = self.dump_rate.min(self.queue.len());
        self.queue.drain(..n).collect()
    }

    /// Record whether `chunk` was delivered and decide what comes next.
    pub fn record(&mut self, chunk: Vec<Vote>, delivered: bool) -> DrainStep {
        debug_assert_eq!(self.state, DrainState::Draining);
        if !delivered {
            for vote in chunk.into_iter().rev() {
                self.queue.push_front(vote);
            }
            return self.finish(DrainStatus::ChunkFailed);
        }

        self.evicted += chunk.len();
        if chunk.len() >= self.dump_rate && !self.queue.is_empty() {
            self.state = DrainState::Scheduling;
            DrainStep::Schedule(self.schedule.retry_delay)
        } else {
            self.finish(DrainStatus::Completed)
        }
    }

    /// End the drain early, handing back whatever is undelivered.
    pub fn interrupt(&mut self) -> DrainOutcome {
        self.outcome(DrainStatus::Interrupted)
    }

    fn finish(&mut self, status: DrainStatus) -> DrainStep {
        DrainStep::Complete(self.outcome(status))
    }

    fn outcome(&mut self, status: DrainStatus) -> DrainOutcome {
        self.state = DrainState::Done;
        DrainOutcome {
            evicted: self.evicted,
            remaining: std::mem::take(&mut self.queue),
            status,
        }
    }
}

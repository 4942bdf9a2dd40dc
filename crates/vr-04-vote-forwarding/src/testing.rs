//! Test Utilities
//!
//! Deterministic stand-ins for the outbound ports. Available in this crate's
//! tests and, with the `test-utils` feature, to other crates.

use crate::ports::{ConsumerNetwork, ScheduledTask, Scheduler};
use parking_lot::Mutex;
use shared_types::{decode_batch, Vote};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

/// Scheduler that queues tasks until the test runs them.
///
/// Records every requested delay so cool-down sequences can be asserted.
#[derive(Default)]
pub struct ManualScheduler {
    pending: Mutex<VecDeque<ScheduledTask>>,
    delays: Mutex<Vec<Duration>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }

    /// Tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Run the oldest waiting task. Returns false if there was none.
    pub fn run_next(&self) -> bool {
        let next = self.pending.lock().pop_front();
        match next {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until none are left, including ones scheduled meanwhile.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Drop every waiting task without running it.
    pub fn discard_all(&self) {
        let tasks: Vec<ScheduledTask> = self.pending.lock().drain(..).collect();
        drop(tasks);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, task: ScheduledTask) {
        self.delays.lock().push(delay);
        self.pending.lock().push_back(task);
    }
}

/// Consumer network that records every send and fails on demand.
#[derive(Default)]
pub struct RecordingNetwork {
    consumers: Mutex<Vec<String>>,
    down: Mutex<HashSet<String>>,
    scripted: Mutex<HashMap<String, VecDeque<bool>>>,
    attempts: Mutex<Vec<(String, Vec<u8>, bool)>>,
}

impl RecordingNetwork {
    pub fn new<I, S>(consumers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            consumers: Mutex::new(consumers.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Mark a consumer unreachable (or reachable again).
    pub fn set_down(&self, consumer: &str, down: bool) {
        let mut set = self.down.lock();
        if down {
            set.insert(consumer.to_string());
        } else {
            set.remove(consumer);
        }
    }

    /// Outcomes for the next sends to `consumer`, used before the up/down
    /// state applies.
    pub fn script(&self, consumer: &str, outcomes: impl IntoIterator<Item = bool>) {
        self.scripted
            .lock()
            .entry(consumer.to_string())
            .or_default()
            .extend(outcomes);
    }

    /// Number of send attempts to `consumer`.
    pub fn attempts(&self, consumer: &str) -> usize {
        self.attempts
            .lock()
            .iter()
            .filter(|(name, _, _)| name == consumer)
            .count()
    }

    /// Votes of every successful send to `consumer`, one entry per message.
    pub fn delivered(&self, consumer: &str) -> Vec<Vec<Vote>> {
        self.attempts
            .lock()
            .iter()
            .filter(|(name, _, ok)| name == consumer && *ok)
            .map(|(_, data, _)| decode_batch(data).unwrap_or_default())
            .collect()
    }

    /// Votes of every successful send to `consumer`, flattened.
    pub fn delivered_votes(&self, consumer: &str) -> Vec<Vote> {
        self.delivered(consumer).into_iter().flatten().collect()
    }
}

impl ConsumerNetwork for RecordingNetwork {
    fn known_consumers(&self) -> Vec<String> {
        self.consumers.lock().clone()
    }

    fn send_to_consumer(&self, consumer: &str, data: &[u8]) -> bool {
        let scripted = self
            .scripted
            .lock()
            .get_mut(consumer)
            .and_then(VecDeque::pop_front);
        let ok = scripted.unwrap_or_else(|| !self.down.lock().contains(consumer));
        self.attempts
            .lock()
            .push((consumer.to_string(), data.to_vec(), ok));
        ok
    }
}

//! # Eviction/Replay Engine
//!
//! Drives a [`DrainJob`] through the [`Scheduler`] port. Each attempt is a
//! separate scheduled task; nothing sleeps on a thread and the call stack
//! does not grow with the backlog.
//!
//! ## In-flight Replays
//!
//! ```text
//! drain ──register──→ [slot] ←──scheduled attempt takes it, runs one chunk, puts it back
//!                        ↑
//!                 cancel_all takes it at shutdown
//! ```
//!
//! Every drain waiting on the scheduler sits in a slot registered with the
//! engine. Whoever takes the run out of its slot first ends it:
//!
//! - the scheduled attempt, which delivers a chunk and reschedules or
//!   completes;
//! - [`EvictionEngine::cancel_all`], which ends it as
//!   [`DrainStatus::Interrupted`] so its votes reach the completion callback
//!   before the cache is saved;
//! - the scheduler dropping the attempt unrun, which also reports
//!   `Interrupted`.
//!
//! A slot is locked for the whole of an attempt, so a cancel never observes
//! a chunk half delivered.

use crate::domain::{DrainJob, DrainOutcome, DrainSchedule, DrainStatus, DrainStep, ForwardingStats};
use crate::ports::{ConsumerNetwork, Scheduler};
use parking_lot::Mutex;
use shared_types::{encode_batch, CacheKey, Vote};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Called exactly once when a drain ends.
pub type DrainCallback = Box<dyn FnOnce(DrainOutcome) + Send + 'static>;

type RunSlot = Arc<Mutex<Option<DrainRun>>>;

/// Drains waiting on the scheduler.
#[derive(Default)]
struct InFlight {
    next_id: AtomicU64,
    runs: Mutex<HashMap<u64, RunSlot>>,
    halted: AtomicBool,
}

/// Replays held queues to backend servers in bounded chunks.
#[derive(Clone)]
pub struct EvictionEngine {
    network: Arc<dyn ConsumerNetwork>,
    scheduler: Arc<dyn Scheduler>,
    stats: Arc<ForwardingStats>,
    dump_rate: usize,
    schedule: DrainSchedule,
    in_flight: Arc<InFlight>,
}

impl EvictionEngine {
    pub fn new(
        network: Arc<dyn ConsumerNetwork>,
        scheduler: Arc<dyn Scheduler>,
        stats: Arc<ForwardingStats>,
        dump_rate: usize,
        schedule: DrainSchedule,
    ) -> Self {
        Self {
            network,
            scheduler,
            stats,
            dump_rate,
            schedule,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Replay `votes` (held under `source`) to the server `target`.
    ///
    /// An empty queue completes before this returns; otherwise the first
    /// chunk goes out after the initial cool-down. After
    /// [`cancel_all`](Self::cancel_all) every drain is interrupted at once.
    pub fn drain(
        &self,
        target: &str,
        source: CacheKey,
        votes: VecDeque<Vote>,
        on_complete: DrainCallback,
    ) {
        let mut run = DrainRun {
            job: DrainJob::new(votes, self.dump_rate, self.schedule),
            target: target.to_string(),
            source,
            engine: self.clone(),
            on_complete: Some(on_complete),
        };
        match run.job.start() {
            DrainStep::Complete(outcome) => run.finish(outcome),
            DrainStep::Schedule(delay) => {
                let slot: RunSlot = Arc::new(Mutex::new(Some(run)));
                match self.register(&slot) {
                    Some(id) => self.schedule_attempt(id, slot, delay),
                    // Halted: the run drops here as interrupted.
                    None => drop(slot),
                }
            }
        }
    }

    /// Interrupt every drain waiting on the scheduler and stop accepting new
    /// ones. Each interrupted drain hands its undelivered votes to its
    /// completion callback before this returns. Returns how many were
    /// interrupted.
    pub fn cancel_all(&self) -> usize {
        self.in_flight.halted.store(true, Ordering::SeqCst);
        let slots: Vec<RunSlot> = self.in_flight.runs.lock().drain().map(|(_, slot)| slot).collect();

        let mut interrupted = 0;
        for slot in slots {
            let mut guard = slot.lock();
            if let Some(run) = guard.take() {
                drop(run);
                interrupted += 1;
            }
        }
        if interrupted > 0 {
            info!(interrupted, "Interrupted pending replays");
        }
        interrupted
    }

    /// Drains currently waiting on the scheduler.
    pub fn in_flight(&self) -> usize {
        self.in_flight.runs.lock().len()
    }

    pub fn is_halted(&self) -> bool {
        self.in_flight.halted.load(Ordering::SeqCst)
    }

    fn register(&self, slot: &RunSlot) -> Option<u64> {
        let mut runs = self.in_flight.runs.lock();
        if self.is_halted() {
            return None;
        }
        let id = self.in_flight.next_id.fetch_add(1, Ordering::Relaxed);
        runs.insert(id, Arc::clone(slot));
        Some(id)
    }

    fn schedule_attempt(&self, id: u64, slot: RunSlot, delay: Duration) {
        let pending = PendingAttempt {
            id,
            slot: Some(slot),
            engine: self.clone(),
        };
        self.scheduler
            .schedule_after(delay, Box::new(move || pending.run()));
    }

    fn attempt(&self, id: u64, slot: RunSlot) {
        let mut guard = slot.lock();
        // Cancelled while waiting.
        let Some(mut run) = guard.take() else {
            return;
        };
        match run.attempt() {
            DrainStep::Schedule(delay) => {
                *guard = Some(run);
                drop(guard);
                self.schedule_attempt(id, slot, delay);
            }
            DrainStep::Complete(outcome) => {
                self.in_flight.runs.lock().remove(&id);
                run.finish(outcome);
            }
        }
    }

    fn abandon(&self, id: u64, slot: &RunSlot) {
        let mut guard = slot.lock();
        if let Some(run) = guard.take() {
            self.in_flight.runs.lock().remove(&id);
            drop(run);
        }
    }
}

impl std::fmt::Debug for EvictionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvictionEngine")
            .field("dump_rate", &self.dump_rate)
            .field("schedule", &self.schedule)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// The scheduled half of a drain. Dropped unrun, it abandons the drain.
struct PendingAttempt {
    id: u64,
    slot: Option<RunSlot>,
    engine: EvictionEngine,
}

impl PendingAttempt {
    fn run(mut self) {
        if let Some(slot) = self.slot.take() {
            self.engine.attempt(self.id, slot);
        }
    }
}

impl Drop for PendingAttempt {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.engine.abandon(self.id, &slot);
        }
    }
}

/// A drain in flight.
struct DrainRun {
    job: DrainJob,
    target: String,
    source: CacheKey,
    engine: EvictionEngine,
    on_complete: Option<DrainCallback>,
}

impl DrainRun {
    fn attempt(&mut self) -> DrainStep {
        let chunk = self.job.take_chunk();
        let delivered = match encode_batch(&chunk) {
            Ok(data) => self.engine.network.send_to_consumer(&self.target, &data),
            Err(e) => {
                error!(server = %self.target, error = %e, "Unable to encode replay chunk");
                false
            }
        };
        debug!(
            server = %self.target,
            source = %self.source,
            chunk = chunk.len(),
            delivered,
            "Replay chunk attempted"
        );
        self.job.record(chunk, delivered)
    }

    fn finish(&mut self, outcome: DrainOutcome) {
        self.engine.stats.record_replayed(outcome.evicted);
        match outcome.status {
            DrainStatus::Completed | DrainStatus::ChunkFailed => {
                if outcome.evicted > 0 {
                    info!(
                        evicted = outcome.evicted,
                        server = %self.target,
                        "Successfully evicted votes to {}", self.source
                    );
                }
                if !outcome.remaining.is_empty() {
                    info!(
                        held = outcome.remaining.len(),
                        "Held votes for {}", self.source
                    );
                }
            }
            DrainStatus::Interrupted => warn!(
                evicted = outcome.evicted,
                held = outcome.remaining.len(),
                server = %self.target,
                "Replay for {} interrupted before completion", self.source
            ),
        }
        if let Some(callback) = self.on_complete.take() {
            callback(outcome);
        }
    }
}

impl Drop for DrainRun {
    fn drop(&mut self) {
        if self.on_complete.is_some() {
            let outcome = self.job.interrupt();
            self.finish(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualScheduler, RecordingNetwork};

    fn votes(n: usize) -> VecDeque<Vote> {
        (0..n)
            .map(|i| Vote::new("Site", format!("user{}", i), "127.0.0.1", i.to_string()))
            .collect()
    }

    struct Harness {
        network: Arc<RecordingNetwork>,
        scheduler: Arc<ManualScheduler>,
        engine: EvictionEngine,
        outcome: Arc<Mutex<Option<DrainOutcome>>>,
    }

    impl Harness {
        fn new(dump_rate: usize) -> Self {
            let network = Arc::new(RecordingNetwork::new(["lobby"]));
            let scheduler = Arc::new(ManualScheduler::new());
            let engine = EvictionEngine::new(
                network.clone(),
                scheduler.clone(),
                Arc::new(ForwardingStats::default()),
                dump_rate,
                DrainSchedule::default(),
            );
            Self {
                network,
                scheduler,
                engine,
                outcome: Arc::new(Mutex::new(None)),
            }
        }

        fn drain(&self, queue: VecDeque<Vote>) {
            let slot = Arc::clone(&self.outcome);
            self.engine.drain(
                "lobby",
                CacheKey::Server("lobby".into()),
                queue,
                Box::new(move |outcome| *slot.lock() = Some(outcome)),
            );
        }

        fn outcome(&self) -> Option<DrainOutcome> {
            self.outcome.lock().clone()
        }
    }

    #[test]
    fn test_empty_queue_completes_without_scheduling() {
        let h = Harness::new(5);
        h.drain(VecDeque::new());

        let outcome = h.outcome().unwrap();
        assert!(outcome.remaining.is_empty());
        assert_eq!(outcome.status, DrainStatus::Completed);
        assert_eq!(h.scheduler.pending(), 0);
    }

    #[test]
    fn test_backlog_drains_in_chunks_with_cool_downs() {
        let dump_rate = 5;
        let h = Harness::new(dump_rate);
        let queue = votes(2 * dump_rate + 1);
        h.drain(queue.clone());

        assert!(h.outcome().is_none());
        assert_eq!(h.scheduler.run_all(), 3);

        let chunks = h.network.delivered("lobby");
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, [5, 5, 1]);
        assert_eq!(
            chunks.into_iter().flatten().collect::<VecDeque<_>>(),
            queue
        );
        assert_eq!(
            h.scheduler.delays(),
            [
                Duration::from_secs(3),
                Duration::from_secs(1),
                Duration::from_secs(1)
            ]
        );

        let outcome = h.outcome().unwrap();
        assert_eq!(outcome.evicted, 11);
        assert!(outcome.remaining.is_empty());
    }

    #[test]
    fn test_failed_chunk_stops_drain() {
        let h = Harness::new(2);
        h.network.script("lobby", [true, false]);
        let queue = votes(6);
        h.drain(queue.clone());

        assert_eq!(h.scheduler.run_all(), 2);
        assert_eq!(h.network.attempts("lobby"), 2);

        let outcome = h.outcome().unwrap();
        assert_eq!(outcome.status, DrainStatus::ChunkFailed);
        assert_eq!(outcome.evicted, 2);
        assert_eq!(
            outcome.remaining,
            queue.into_iter().skip(2).collect::<VecDeque<_>>()
        );
    }

    #[test]
    fn test_dropped_task_reports_interruption() {
        let h = Harness::new(2);
        let queue = votes(5);
        h.drain(queue.clone());
        assert!(h.scheduler.run_next());

        h.scheduler.discard_all();

        let outcome = h.outcome().unwrap();
        assert_eq!(outcome.status, DrainStatus::Interrupted);
        assert_eq!(outcome.evicted, 2);
        assert_eq!(
            outcome.remaining,
            queue.into_iter().skip(2).collect::<VecDeque<_>>()
        );
    }

    #[test]
    fn test_finished_drains_leave_the_registry() {
        let h = Harness::new(5);
        h.drain(votes(3));
        assert_eq!(h.engine.in_flight(), 1);

        h.scheduler.run_all();

        assert_eq!(h.engine.in_flight(), 0);
        assert_eq!(h.outcome().unwrap().status, DrainStatus::Completed);
    }

    #[test]
    fn test_cancel_all_hands_back_waiting_drain() {
        let h = Harness::new(2);
        let queue = votes(5);
        h.drain(queue.clone());
        assert!(h.scheduler.run_next());

        assert_eq!(h.engine.cancel_all(), 1);

        let outcome = h.outcome().unwrap();
        assert_eq!(outcome.status, DrainStatus::Interrupted);
        assert_eq!(
            outcome.remaining,
            queue.into_iter().skip(2).collect::<VecDeque<_>>()
        );
        assert_eq!(h.engine.in_flight(), 0);

        // The attempt still queued on the scheduler finds nothing to send.
        h.scheduler.run_all();
        assert_eq!(h.network.attempts("lobby"), 1);
    }

    #[test]
    fn test_drain_after_cancel_is_interrupted_at_once() {
        let h = Harness::new(5);
        h.engine.cancel_all();
        assert!(h.engine.is_halted());

        h.drain(votes(2));

        let outcome = h.outcome().unwrap();
        assert_eq!(outcome.status, DrainStatus::Interrupted);
        assert_eq!(outcome.remaining.len(), 2);
        assert_eq!(h.scheduler.pending(), 0);
    }

    #[test]
    fn test_cancel_all_with_nothing_in_flight() {
        let h = Harness::new(5);
        assert_eq!(h.engine.cancel_all(), 0);
        assert!(h.outcome().is_none());
    }
}

//! Dispatch counters for a worker.
//!
//! Kept as atomics so producers and the consumer thread can update them
//! without locking, and mirrored to the `metrics` facade. No recorder is
//! installed by this crate; without one the facade calls are no-ops.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared between a worker handle and its consumer thread.
#[derive(Debug)]
pub struct WorkerStats {
    worker: String,
    submitted: AtomicU64,
    dispatched: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`WorkerStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Commands accepted by `submit`.
    pub submitted: u64,
    /// Commands handed to the handler, including failed ones.
    pub dispatched: u64,
    /// Dispatches that returned an error or panicked, plus panicked hooks.
    pub failed: u64,
}

impl StatsSnapshot {
    /// Commands accepted but not yet dispatched.
    #[must_use]
    pub fn pending(&self) -> u64 {
        self.submitted.saturating_sub(self.dispatched)
    }
}

impl WorkerStats {
    pub(crate) fn new(worker: &str) -> Self {
        Self {
            worker: worker.to_string(),
            submitted: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("asynclog_commands_submitted_total", "worker" => self.worker.clone())
            .increment(1);
    }

    pub(crate) fn record_dispatched(&self, queue_depth: usize) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("asynclog_commands_dispatched_total", "worker" => self.worker.clone())
            .increment(1);
        #[allow(clippy::cast_precision_loss)]
        let depth = queue_depth as f64;
        metrics::gauge!("asynclog_queue_depth", "worker" => self.worker.clone()).set(depth);
    }

    pub(crate) fn record_fault(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("asynclog_command_faults_total", "worker" => self.worker.clone())
            .increment(1);
    }

    /// Copies the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct ObserverMetrics {
    cycles: AtomicU64,
    seen: AtomicU64,
    added: AtomicU64,
    updated: AtomicU64,
    sweeps: AtomicU64,
    evicted: AtomicU64,
    callback_failures: AtomicU64,
}

fn add(counter: &AtomicU64, by: usize) {
    counter.fetch_add(by as u64, Ordering::Relaxed);
}

impl ObserverMetrics {
    pub fn record_observe(&self, seen: usize, added: usize, updated: usize) {
        add(&self.cycles, 1);
        add(&self.seen, seen);
        add(&self.added, added);
        add(&self.updated, updated);
    }

    pub fn record_sweep(&self, evicted: usize) {
        add(&self.sweeps, 1);
        add(&self.evicted, evicted);
    }

    pub fn record_callback_failure(&self) {
        add(&self.callback_failures, 1);
    }

    pub fn snapshot(&self) -> ObserverMetricsSnapshot {
        ObserverMetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            seen: self.seen.load(Ordering::Relaxed),
            added: self.added.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ObserverMetricsSnapshot {
    pub cycles: u64,
    pub seen: u64,
    pub added: u64,
    pub updated: u64,
    pub sweeps: u64,
    pub evicted: u64,
    pub callback_failures: u64,
}

//! Observability stubs (metrics, tracing)

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    dispatches: AtomicU64,
    dispatch_failures: AtomicU64,
    requests_handled: AtomicU64,
    chain_short_circuits: AtomicU64,
    chain_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "dispatches", "Metric incremented");
    }

    pub fn dispatch_failure(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "dispatch_failures", "Metric incremented");
    }

    pub fn request_handled(&self) {
        self.requests_handled.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "requests_handled", "Metric incremented");
    }

    pub fn chain_short_circuit(&self) {
        self.chain_short_circuits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "chain_short_circuits", "Metric incremented");
    }

    pub fn chain_failure(&self) {
        self.chain_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "chain_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatches: self.dispatches.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            requests_handled: self.requests_handled.load(Ordering::Relaxed),
            chain_short_circuits: self.chain_short_circuits.load(Ordering::Relaxed),
            chain_failures: self.chain_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub dispatches: u64,
    pub dispatch_failures: u64,
    pub requests_handled: u64,
    pub chain_short_circuits: u64,
    pub chain_failures: u64,
}

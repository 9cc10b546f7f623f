//! Global atomic counters for inference traffic.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. on shutdown).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Atomic counters, no allocation or locking.
pub struct Metrics {
    inferences_started: AtomicU64,
    inferences_succeeded: AtomicU64,
    inferences_failed: AtomicU64,
    inferences_timed_out: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            inferences_started: AtomicU64::new(0),
            inferences_succeeded: AtomicU64::new(0),
            inferences_failed: AtomicU64::new(0),
            inferences_timed_out: AtomicU64::new(0),
        }
    }

    pub fn inc_started(&self) {
        self.inferences_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "inferences_started", "counter incremented");
    }

    pub fn inc_succeeded(&self) {
        self.inferences_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "inferences_succeeded", "counter incremented");
    }

    /// Any failed call, timeouts included.
    pub fn inc_failed(&self) {
        self.inferences_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "inferences_failed", "counter incremented");
    }

    pub fn inc_timed_out(&self) {
        self.inferences_timed_out.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "inferences_timed_out", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            inferences_started = self.started(),
            inferences_succeeded = self.succeeded(),
            inferences_failed = self.failed(),
            inferences_timed_out = self.timed_out(),
        );
    }

    pub fn started(&self) -> u64 {
        self.inferences_started.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.inferences_succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.inferences_failed.load(Ordering::Relaxed)
    }

    pub fn timed_out(&self) -> u64 {
        self.inferences_timed_out.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.inferences_started.store(0, Ordering::Relaxed);
        self.inferences_succeeded.store(0, Ordering::Relaxed);
        self.inferences_failed.store(0, Ordering::Relaxed);
        self.inferences_timed_out.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.inc_started();
        m.inc_started();
        m.inc_succeeded();
        m.inc_failed();
        m.inc_timed_out();

        assert_eq!(m.started(), 2);
        assert_eq!(m.succeeded(), 1);
        assert_eq!(m.failed(), 1);
        assert_eq!(m.timed_out(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_started();
        m.inc_failed();
        m.reset();
        assert_eq!(m.started(), 0);
        assert_eq!(m.failed(), 0);
    }
}

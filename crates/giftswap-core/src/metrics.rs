//! Global atomic counters for giftswap observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. before a process exits).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations and no locking.
pub struct Metrics {
    draws_started: AtomicU64,
    draws_succeeded: AtomicU64,
    draws_exhausted: AtomicU64,
    draws_rejected: AtomicU64,
    attempts_aborted: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            draws_started: AtomicU64::new(0),
            draws_succeeded: AtomicU64::new(0),
            draws_exhausted: AtomicU64::new(0),
            draws_rejected: AtomicU64::new(0),
            attempts_aborted: AtomicU64::new(0),
        }
    }

    /// A search began (input already validated).
    pub fn inc_draws_started(&self) {
        self.draws_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "draws_started", "counter incremented");
    }

    /// A search returned a complete assignment.
    pub fn inc_draws_succeeded(&self) {
        self.draws_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "draws_succeeded", "counter incremented");
    }

    /// A search spent its whole attempt budget.
    pub fn inc_draws_exhausted(&self) {
        self.draws_exhausted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "draws_exhausted", "counter incremented");
    }

    /// Input was refused before any attempt ran.
    pub fn inc_draws_rejected(&self) {
        self.draws_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "draws_rejected", "counter incremented");
    }

    /// One attempt hit a giver with no legal receiver left.
    pub fn inc_attempts_aborted(&self) {
        self.attempts_aborted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "attempts_aborted", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            draws_started = self.draws_started(),
            draws_succeeded = self.draws_succeeded(),
            draws_exhausted = self.draws_exhausted(),
            draws_rejected = self.draws_rejected(),
            attempts_aborted = self.attempts_aborted(),
        );
    }

    pub fn draws_started(&self) -> u64 {
        self.draws_started.load(Ordering::Relaxed)
    }

    pub fn draws_succeeded(&self) -> u64 {
        self.draws_succeeded.load(Ordering::Relaxed)
    }

    pub fn draws_exhausted(&self) -> u64 {
        self.draws_exhausted.load(Ordering::Relaxed)
    }

    pub fn draws_rejected(&self) -> u64 {
        self.draws_rejected.load(Ordering::Relaxed)
    }

    pub fn attempts_aborted(&self) -> u64 {
        self.attempts_aborted.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.draws_started.store(0, Ordering::Relaxed);
        self.draws_succeeded.store(0, Ordering::Relaxed);
        self.draws_exhausted.store(0, Ordering::Relaxed);
        self.draws_rejected.store(0, Ordering::Relaxed);
        self.attempts_aborted.store(0, Ordering::Relaxed);
    }
}

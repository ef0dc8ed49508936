//! Routing counters
//!
//! Sink failures never reach application call sites, so these counters are
//! the programmatic way to notice a degraded sink.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the tee router
///
/// # Example
///
/// ```
/// use tee_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_routed();
/// metrics.record_filtered();
///
/// assert_eq!(metrics.routed_count(), 1);
/// assert_eq!(metrics.filtered_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records that passed the level gate and were handed to the sinks
    routed: AtomicU64,

    /// Records rejected by the level gate
    filtered: AtomicU64,

    /// Routed records for which at least one sink write failed
    degraded: AtomicU64,

    /// Individual failed sink writes
    failed_writes: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            routed: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            degraded: AtomicU64::new(0),
            failed_writes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn routed_count(&self) -> u64 {
        self.routed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn degraded_count(&self) -> u64 {
        self.degraded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// Record a routed entry, returning the previous count
    #[inline]
    pub fn record_routed(&self) -> u64 {
        self.routed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a routed entry whose delivery failed on `failures` sinks
    #[inline]
    pub fn record_failures(&self, failures: usize) {
        if failures > 0 {
            self.degraded.fetch_add(1, Ordering::Relaxed);
            self.failed_writes
                .fetch_add(failures as u64, Ordering::Relaxed);
        }
    }

    /// Percentage (0.0 - 100.0) of routed records that hit a failing sink
    pub fn degraded_rate(&self) -> f64 {
        let routed = self.routed_count() as f64;
        if routed == 0.0 {
            0.0
        } else {
            (self.degraded_count() as f64 / routed) * 100.0
        }
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            routed: AtomicU64::new(self.routed_count()),
            filtered: AtomicU64::new(self.filtered_count()),
            degraded: AtomicU64::new(self.degraded_count()),
            failed_writes: AtomicU64::new(self.failed_writes()),
        }
    }
}

//! Logger metrics for observability
//!
//! Counters for records written, local write failures and export outcomes.
//! One instance is shared by a logger and every child derived from it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use unified_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_logged();
/// metrics.record_export_failure();
///
/// assert_eq!(metrics.total_logged(), 1);
/// assert_eq!(metrics.export_failures(), 1);
/// ```
#[derive(Debug, Default)]
pub struct LoggerMetrics {
    /// Records written to every sink without error
    total_logged: AtomicU64,

    /// Records that failed on at least one sink
    write_failures: AtomicU64,

    /// Records accepted by the collector
    exported: AtomicU64,

    /// Export attempts that failed
    export_failures: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            exported: AtomicU64::new(0),
            export_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn exported(&self) -> u64 {
        self.exported.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn export_failures(&self) -> u64 {
        self.export_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_exported(&self) -> u64 {
        self.exported.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_export_failure(&self) -> u64 {
        self.export_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Export failure rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been exported yet.
    pub fn export_failure_rate(&self) -> f64 {
        let failed = self.export_failures() as f64;
        let total = failed + self.exported() as f64;
        if total == 0.0 {
            0.0
        } else {
            failed / total * 100.0
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.exported.store(0, Ordering::Relaxed);
        self.export_failures.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = LoggerMetrics::new();
        metrics.record_logged();
        metrics.record_logged();
        metrics.record_write_failure();
        assert_eq!(metrics.total_logged(), 2);
        assert_eq!(metrics.write_failures(), 1);

        metrics.reset();
        assert_eq!(metrics.total_logged(), 0);
        assert_eq!(metrics.write_failures(), 0);
    }

    #[test]
    fn test_export_failure_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.export_failure_rate(), 0.0);

        metrics.record_exported();
        metrics.record_exported();
        metrics.record_exported();
        metrics.record_export_failure();
        assert!((metrics.export_failure_rate() - 25.0).abs() < f64::EPSILON);
    }
}

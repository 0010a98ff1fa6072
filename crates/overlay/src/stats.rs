use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for one pipeline.
#[derive(Debug, Default)]
pub struct PipelineStats {
    captured: AtomicU64,
    superseded: AtomicU64,
    stale: AtomicU64,
    conversion_failures: AtomicU64,
    encoding_failures: AtomicU64,
    sent: AtomicU64,
    skipped: AtomicU64,
    predictions: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames copied out of the capture callback.
    pub captured: u64,
    /// Frames overwritten in the gate before the worker took them.
    pub superseded: u64,
    /// Frames discarded because the sensor binding changed.
    pub stale: u64,
    pub conversion_failures: u64,
    pub encoding_failures: u64,
    pub sent: u64,
    /// Encoded frames dropped because the connection was not ready.
    pub skipped: u64,
    pub predictions: u64,
}

impl PipelineStats {
    pub(crate) fn count_captured(&self) {
        self.captured.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_superseded(&self) {
        self.superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_conversion_failure(&self) {
        self.conversion_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_encoding_failure(&self) {
        self.encoding_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_prediction(&self) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            captured: self.captured.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            conversion_failures: self.conversion_failures.load(Ordering::Relaxed),
            encoding_failures: self.encoding_failures.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            predictions: self.predictions.load(Ordering::Relaxed),
        }
    }
}

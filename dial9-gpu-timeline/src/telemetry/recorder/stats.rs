use serde::Serialize;

/// Snapshot of the profiler's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProfilerStats {
    pub samples_taken: u64,
    pub brackets_opened: u64,
    pub brackets_resolved: u64,
    pub events_written: u64,
    /// Timeline samples whose GPU time went backwards.
    pub non_monotonic_samples: u64,
    /// Conversions that fell outside their bracketing samples and were clamped.
    pub out_of_range_lookups: u64,
    /// Framebuffer notifications on non-draw targets.
    pub ignored_boundary_events: u64,
    /// Brackets currently waiting for results.
    pub pending: usize,
    pub pending_high_water: usize,
    /// Times the pending set crossed the warn threshold.
    pub backlog_warnings: u64,
    /// Brackets released at shutdown without being read.
    pub abandoned_brackets: u64,
    pub write_errors: u64,
}

/// Counters owned directly by the profiler (the rest are read from its
/// components when a snapshot is taken).
#[derive(Debug, Default)]
pub(super) struct Counters {
    pub(super) brackets_resolved: u64,
    pub(super) backlog_warnings: u64,
    pub(super) abandoned_brackets: u64,
}

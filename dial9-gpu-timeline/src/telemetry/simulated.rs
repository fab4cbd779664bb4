//! A deterministic software GPU for dry runs and tests.
//!
//! The GPU clock is the shared [`SimulatedClock`] plus a fixed offset, so the
//! exact host time of any GPU timestamp is known. Query results become
//! available after a configurable number of availability polls.

use crate::telemetry::backend::{QueryId, TimestampQueryBackend};
use crate::telemetry::clock::HostClock;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Manually advanced nanosecond clock shared between a [`SimulatedGpu`] and
/// the profiler's host clock.
#[derive(Debug, Clone, Default)]
pub struct SimulatedClock(Rc<Cell<u64>>);

impl SimulatedClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_nanos(&self) -> u64 {
        self.0.get()
    }

    pub fn advance_nanos(&self, nanos: u64) {
        self.0.set(self.0.get() + nanos);
    }
}

impl HostClock for SimulatedClock {
    fn now_seconds(&self) -> f64 {
        self.0.get() as f64 / 1e9
    }
}

#[derive(Debug, Clone, Copy)]
struct SimQuery {
    /// Set once `query_counter` has been issued.
    timestamp: Option<i64>,
    polls_remaining: u32,
    /// Forced ready regardless of the remaining poll count.
    ready: bool,
}

#[derive(Debug)]
pub struct SimulatedGpu {
    clock: SimulatedClock,
    gpu_offset: i64,
    timestamps_supported: bool,
    ext_entry_point: bool,
    result_latency_polls: u32,
    next_query: u32,
    queries: HashMap<QueryId, SimQuery>,
    ext_timestamp_reads: u64,
    core_timestamp_reads: u64,
    queries_generated: u64,
    queries_deleted: u64,
    invalid_deletes: u64,
    results_read: u64,
}

impl SimulatedGpu {
    pub fn new(clock: SimulatedClock) -> Self {
        Self {
            clock,
            gpu_offset: 0,
            timestamps_supported: true,
            ext_entry_point: true,
            result_latency_polls: 0,
            next_query: 1,
            queries: HashMap::new(),
            ext_timestamp_reads: 0,
            core_timestamp_reads: 0,
            queries_generated: 0,
            queries_deleted: 0,
            invalid_deletes: 0,
            results_read: 0,
        }
    }

    /// GPU clock = shared clock + `offset` nanoseconds.
    pub fn with_gpu_offset(mut self, offset: i64) -> Self {
        self.gpu_offset = offset;
        self
    }

    /// Report no timestamp-query capability.
    pub fn without_timestamp_queries(mut self) -> Self {
        self.timestamps_supported = false;
        self
    }

    /// Only export the core timestamp entry point.
    pub fn without_ext_timestamp(mut self) -> Self {
        self.ext_entry_point = false;
        self
    }

    /// Number of availability polls that report `false` before a result
    /// becomes available. Applies to queries issued afterwards.
    pub fn with_result_latency(mut self, polls: u32) -> Self {
        self.result_latency_polls = polls;
        self
    }

    pub fn set_result_latency(&mut self, polls: u32) {
        self.result_latency_polls = polls;
    }

    pub fn clock(&self) -> &SimulatedClock {
        &self.clock
    }

    /// Simulate `nanos` of GPU work by advancing the shared clock.
    pub fn submit_work(&mut self, nanos: u64) {
        self.clock.advance_nanos(nanos);
    }

    /// Make every issued query available on its next poll.
    pub fn complete_all(&mut self) {
        for q in self.queries.values_mut() {
            if q.timestamp.is_some() {
                q.ready = true;
            }
        }
    }

    /// Make a single issued query available on its next poll.
    pub fn complete(&mut self, query: QueryId) {
        if let Some(q) = self.queries.get_mut(&query)
            && q.timestamp.is_some()
        {
            q.ready = true;
        }
    }

    /// Queries generated and not yet deleted.
    pub fn live_queries(&self) -> usize {
        self.queries.len()
    }

    pub fn queries_generated(&self) -> u64 {
        self.queries_generated
    }

    pub fn queries_deleted(&self) -> u64 {
        self.queries_deleted
    }

    /// Deletes of handles that were never generated or already deleted.
    pub fn invalid_deletes(&self) -> u64 {
        self.invalid_deletes
    }

    pub fn results_read(&self) -> u64 {
        self.results_read
    }

    pub fn ext_timestamp_reads(&self) -> u64 {
        self.ext_timestamp_reads
    }

    pub fn core_timestamp_reads(&self) -> u64 {
        self.core_timestamp_reads
    }

    fn gpu_now(&self) -> i64 {
        self.clock.now_nanos() as i64 + self.gpu_offset
    }
}

impl TimestampQueryBackend for SimulatedGpu {
    fn supports_timestamp_queries(&self) -> bool {
        self.timestamps_supported
    }

    fn get_timestamp_ext(&mut self) -> Option<i64> {
        if !self.ext_entry_point {
            return None;
        }
        self.ext_timestamp_reads += 1;
        Some(self.gpu_now())
    }

    fn get_timestamp(&mut self) -> i64 {
        self.core_timestamp_reads += 1;
        self.gpu_now()
    }

    fn gen_query(&mut self) -> QueryId {
        let id = QueryId(self.next_query);
        self.next_query += 1;
        self.queries_generated += 1;
        self.queries.insert(
            id,
            SimQuery {
                timestamp: None,
                polls_remaining: 0,
                ready: false,
            },
        );
        id
    }

    fn query_counter(&mut self, query: QueryId) {
        let now = self.gpu_now();
        let latency = self.result_latency_polls;
        if let Some(q) = self.queries.get_mut(&query) {
            q.timestamp = Some(now);
            q.polls_remaining = latency;
        }
    }

    fn is_result_available(&mut self, query: QueryId) -> bool {
        let Some(q) = self.queries.get_mut(&query) else {
            return false;
        };
        if q.timestamp.is_none() {
            return false;
        }
        if q.ready || q.polls_remaining == 0 {
            return true;
        }
        q.polls_remaining -= 1;
        false
    }

    fn query_result(&mut self, query: QueryId) -> i64 {
        self.results_read += 1;
        self.queries
            .get(&query)
            .and_then(|q| q.timestamp)
            .unwrap_or_default()
    }

    fn delete_query(&mut self, query: QueryId) {
        if self.queries.remove(&query).is_some() {
            self.queries_deleted += 1;
        } else {
            self.invalid_deletes += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_records_offset_clock() {
        let clock = SimulatedClock::new();
        let mut gpu = SimulatedGpu::new(clock.clone()).with_gpu_offset(1_000);
        gpu.submit_work(500);
        let q = gpu.gen_query();
        gpu.query_counter(q);
        assert!(gpu.is_result_available(q));
        assert_eq!(gpu.query_result(q), 1_500);
    }

    #[test]
    fn test_result_latency_counts_polls() {
        let mut gpu = SimulatedGpu::new(SimulatedClock::new()).with_result_latency(2);
        let q = gpu.gen_query();
        gpu.query_counter(q);
        assert!(!gpu.is_result_available(q));
        assert!(!gpu.is_result_available(q));
        assert!(gpu.is_result_available(q));
    }

    #[test]
    fn test_complete_overrides_latency() {
        let mut gpu = SimulatedGpu::new(SimulatedClock::new()).with_result_latency(u32::MAX);
        let q = gpu.gen_query();
        gpu.query_counter(q);
        assert!(!gpu.is_result_available(q));
        gpu.complete(q);
        assert!(gpu.is_result_available(q));
    }

    #[test]
    fn test_unissued_query_never_available() {
        let mut gpu = SimulatedGpu::new(SimulatedClock::new());
        let q = gpu.gen_query();
        gpu.complete_all();
        assert!(!gpu.is_result_available(q));
    }

    #[test]
    fn test_delete_tracking() {
        let mut gpu = SimulatedGpu::new(SimulatedClock::new());
        let q = gpu.gen_query();
        assert_eq!(gpu.live_queries(), 1);
        gpu.delete_query(q);
        gpu.delete_query(q);
        assert_eq!(gpu.live_queries(), 0);
        assert_eq!(gpu.queries_deleted(), 1);
        assert_eq!(gpu.invalid_deletes(), 1);
    }
}

mod event_writer;
mod stats;

pub use stats::ProfilerStats;

use event_writer::EventWriter;
use stats::Counters;

use crate::telemetry::backend::TimestampQueryBackend;
use crate::telemetry::clock::{ClockSampler, HostClock, MonotonicClock};
use crate::telemetry::config::{ProfilerConfig, TeardownPolicy};
use crate::telemetry::error::Result;
use crate::telemetry::events::{EventSource, TraceEvent};
use crate::telemetry::pending::{DrainReport, PendingSet};
use crate::telemetry::query::{BoundaryOutcome, BracketTracker, FramebufferTarget, OpenBracket};
use crate::telemetry::timeline::Timeline;
use crate::telemetry::writer::TraceWriter;
use std::time::Instant;

/// Correlates GPU timestamp queries with the host clock for one benchmark
/// run.
///
/// The profiler owns the backend, the clock timeline, the open bracket and
/// every query handle it issues. Drive it with:
///
/// - [`on_iteration_start`](Self::on_iteration_start) once per outer
///   iteration, before any GPU work, to take a correlated clock sample;
/// - [`on_framebuffer_change`](Self::on_framebuffer_change) from inside the
///   replayed command stream;
/// - [`on_iteration_end`](Self::on_iteration_end) once per outer iteration to
///   harvest whatever results the GPU has finished, without waiting.
///
/// Outstanding queries are handled by the configured [`TeardownPolicy`] on
/// [`shutdown`](Self::shutdown) or drop; no handle outlives the profiler.
pub struct GpuProfiler<B: TimestampQueryBackend, H: HostClock = MonotonicClock> {
    backend: B,
    sampler: ClockSampler<H>,
    timeline: Timeline,
    tracker: BracketTracker,
    pending: PendingSet,
    event_writer: EventWriter,
    config: ProfilerConfig,
    /// GPU timing is possible: enabled in config and supported by the backend.
    gpu_active: bool,
    over_threshold: bool,
    shut_down: bool,
    counters: Counters,
}

impl<B: TimestampQueryBackend, H: HostClock> GpuProfiler<B, H> {
    /// Whether GPU timing is being collected. False when the backend has no
    /// timestamp queries, profiling is disabled, or after shutdown.
    pub fn is_active(&self) -> bool {
        self.gpu_active
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, for submitting GPU work between notifications.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn open_bracket(&self) -> Option<&OpenBracket> {
        self.tracker.open_bracket()
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    /// False once the trace writer has failed and been dropped.
    pub fn trace_output_enabled(&self) -> bool {
        self.event_writer.is_enabled()
    }

    pub fn host_now(&self) -> f64 {
        self.sampler.host_clock().now_seconds()
    }

    pub fn stats(&self) -> ProfilerStats {
        ProfilerStats {
            samples_taken: self.sampler.samples_taken(),
            brackets_opened: self.tracker.brackets_opened(),
            brackets_resolved: self.counters.brackets_resolved,
            events_written: self.event_writer.events_written,
            non_monotonic_samples: self.timeline.non_monotonic_samples(),
            out_of_range_lookups: self.timeline.out_of_range_lookups(),
            ignored_boundary_events: self.tracker.ignored_events(),
            pending: self.pending.len(),
            pending_high_water: self.pending.high_water(),
            backlog_warnings: self.counters.backlog_warnings,
            abandoned_brackets: self.counters.abandoned_brackets,
            write_errors: self.event_writer.write_errors,
        }
    }

    /// Take one correlated clock sample.
    pub fn on_iteration_start(&mut self) {
        if !self.gpu_active {
            return;
        }
        self.sampler
            .sample_into(&mut self.backend, &mut self.timeline);
    }

    /// Harvest every bracket whose results are ready. Never waits.
    pub fn on_iteration_end(&mut self) -> DrainReport {
        if !self.gpu_active {
            return DrainReport::default();
        }
        let report = self.drain_pass();
        if self.pending.len() <= self.config.pending_warn_threshold {
            self.over_threshold = false;
        }
        report
    }

    /// A framebuffer binding changed inside the replayed command stream.
    pub fn on_framebuffer_change(
        &mut self,
        target: FramebufferTarget,
        framebuffer: u32,
    ) -> BoundaryOutcome {
        if !self.gpu_active {
            return BoundaryOutcome::Ignored;
        }
        let outcome = self
            .tracker
            .on_framebuffer_change(&mut self.backend, target, framebuffer);
        if let BoundaryOutcome::Opened {
            closed: Some(closed),
        } = outcome
        {
            let pending = self.pending.push(closed);
            self.check_backlog(pending);
        }
        outcome
    }

    /// Convert a raw GPU timestamp to host seconds, sampling the clocks if
    /// the timeline doesn't reach that far yet.
    ///
    /// Returns `None` without touching either clock when GPU timing is
    /// inactive (unsupported, disabled, or shut down).
    pub fn host_time_for(&mut self, gpu_time: i64) -> Option<f64> {
        if !self.gpu_active {
            return None;
        }
        let Self {
            backend,
            sampler,
            timeline,
            ..
        } = self;
        Some(timeline.host_time_for(gpu_time, || sampler.sample(backend)))
    }

    /// Mark the start of a host-side interval (e.g. a replayed frame).
    pub fn begin_host_event(&mut self, label: &str) {
        if self.shut_down || !self.config.enabled {
            return;
        }
        let now = self.host_now();
        self.event_writer
            .write(&TraceEvent::begin(label, now, EventSource::Host));
    }

    pub fn end_host_event(&mut self, label: &str) {
        if self.shut_down || !self.config.enabled {
            return;
        }
        let now = self.host_now();
        self.event_writer
            .write(&TraceEvent::end(label, now, EventSource::Host));
    }

    /// Apply the teardown policy, release every outstanding query and flush
    /// the writer. Idempotent; also run on drop.
    pub fn shutdown(&mut self) -> ProfilerStats {
        if self.shut_down {
            return self.stats();
        }
        self.shut_down = true;

        if self.gpu_active {
            match self.config.teardown {
                TeardownPolicy::Discard => {
                    if let Some(open) = self.tracker.abandon() {
                        self.backend.delete_query(open.begin);
                        self.counters.abandoned_brackets += 1;
                    }
                }
                TeardownPolicy::Drain { .. } => self.drain_for_teardown(),
            }

            let released = self.pending.release_all(&mut self.backend);
            if released > 0 {
                self.counters.abandoned_brackets += released as u64;
                tracing::warn!(
                    released,
                    "released unresolved timestamp queries at shutdown"
                );
            }
            self.gpu_active = false;
        }

        self.event_writer.flush();
        let stats = self.stats();
        tracing::debug!(?stats, "gpu profiler shut down");
        stats
    }

    fn drain_for_teardown(&mut self) {
        if let Some(closed) = self.tracker.close(&mut self.backend) {
            self.pending.push(closed);
        }
        let timeout = self.config.teardown.drain_timeout().unwrap_or_default();
        let poll_interval = self.config.teardown_poll_interval();
        let deadline = Instant::now() + timeout;
        loop {
            self.drain_pass();
            if self.pending.is_empty() || Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(poll_interval);
        }
    }

    fn drain_pass(&mut self) -> DrainReport {
        let Self {
            backend,
            sampler,
            timeline,
            pending,
            event_writer,
            counters,
            ..
        } = self;
        pending.drain(backend, |backend, resolved| {
            let label = resolved.key.label();
            let begin = timeline.host_time_for(resolved.begin_gpu_time, || sampler.sample(backend));
            let end = timeline.host_time_for(resolved.end_gpu_time, || sampler.sample(backend));
            event_writer.write(&TraceEvent::begin(label.clone(), begin, EventSource::Gpu));
            event_writer.write(&TraceEvent::end(label, end, EventSource::Gpu));
            counters.brackets_resolved += 1;
        })
    }

    fn check_backlog(&mut self, pending: usize) {
        let threshold = self.config.pending_warn_threshold;
        if pending > threshold && !self.over_threshold {
            self.over_threshold = true;
            self.counters.backlog_warnings += 1;
            tracing::warn!(
                pending,
                threshold,
                "GPU timestamp results are falling behind submission"
            );
        }
    }
}

impl<B: TimestampQueryBackend, H: HostClock> Drop for GpuProfiler<B, H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub struct GpuProfilerBuilder<H = MonotonicClock> {
    config: ProfilerConfig,
    host_clock: H,
}

impl Default for GpuProfilerBuilder<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuProfilerBuilder<MonotonicClock> {
    pub fn new() -> Self {
        Self {
            config: ProfilerConfig::default(),
            host_clock: MonotonicClock::new(),
        }
    }
}

impl<H: HostClock> GpuProfilerBuilder<H> {
    pub fn with_config(mut self, config: ProfilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn with_teardown(mut self, teardown: TeardownPolicy) -> Self {
        self.config.teardown = teardown;
        self
    }

    pub fn with_pending_warn_threshold(mut self, threshold: usize) -> Self {
        self.config.pending_warn_threshold = threshold;
        self
    }

    /// Use a different host clock. Host-side events and converted GPU events
    /// are reported in this clock's domain.
    pub fn with_host_clock<C: HostClock>(self, host_clock: C) -> GpuProfilerBuilder<C> {
        GpuProfilerBuilder {
            config: self.config,
            host_clock,
        }
    }

    pub fn build<B: TimestampQueryBackend>(
        self,
        backend: B,
        writer: Box<dyn TraceWriter>,
    ) -> Result<GpuProfiler<B, H>> {
        self.config.validate()?;

        let supported = backend.supports_timestamp_queries();
        if !supported {
            tracing::info!("backend has no timestamp queries; GPU profiling disabled");
        }
        let gpu_active = self.config.enabled && supported;

        Ok(GpuProfiler {
            backend,
            sampler: ClockSampler::new(self.host_clock),
            timeline: Timeline::new(),
            tracker: BracketTracker::new(),
            pending: PendingSet::new(),
            event_writer: EventWriter::new(writer),
            config: self.config,
            gpu_active,
            over_threshold: false,
            shut_down: false,
            counters: Counters::default(),
        })
    }
}

/// Entry point for setting up a [`GpuProfiler`].
pub struct GpuTimeline;

impl GpuTimeline {
    pub fn builder() -> GpuProfilerBuilder {
        GpuProfilerBuilder::new()
    }

    /// Build with the default configuration and the monotonic host clock.
    pub fn build<B: TimestampQueryBackend>(
        backend: B,
        writer: Box<dyn TraceWriter>,
    ) -> Result<GpuProfiler<B>> {
        GpuProfilerBuilder::new().build(backend, writer)
    }
}

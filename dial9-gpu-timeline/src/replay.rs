//! The benchmark loop: replays a captured frame range and drives the
//! profiler's hooks around it.

use crate::telemetry::backend::TimestampQueryBackend;
use crate::telemetry::clock::{HostClock, MonotonicClock};
use crate::telemetry::error::{ProfilerError, Result};
use crate::telemetry::pending::DrainReport;
use crate::telemetry::query::{BoundaryOutcome, FramebufferTarget};
use crate::telemetry::recorder::GpuProfiler;
use std::ops::Range;

pub type ReplayError = Box<dyn std::error::Error + Send + Sync>;

/// A captured command stream that can be replayed frame by frame.
pub trait TraceReplay<B: TimestampQueryBackend, H: HostClock = MonotonicClock> {
    /// Frames to replay, `start..end`. Must not be empty.
    fn frame_range(&self) -> Range<u32>;

    /// Submit the commands of one frame. Framebuffer changes inside the
    /// frame are reported through [`FrameContext::framebuffer_changed`].
    fn replay_frame(
        &mut self,
        frame: u32,
        ctx: &mut FrameContext<'_, B, H>,
    ) -> std::result::Result<(), ReplayError>;

    /// Present the frame.
    fn swap(&mut self, _ctx: &mut FrameContext<'_, B, H>) {}
}

/// What a replay sees while a frame is being submitted.
pub struct FrameContext<'a, B: TimestampQueryBackend, H: HostClock = MonotonicClock> {
    profiler: &'a mut GpuProfiler<B, H>,
}

impl<'a, B: TimestampQueryBackend, H: HostClock> FrameContext<'a, B, H> {
    pub fn new(profiler: &'a mut GpuProfiler<B, H>) -> Self {
        Self { profiler }
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.profiler.backend_mut()
    }

    /// Forward a framebuffer-binding notification to the profiler.
    pub fn framebuffer_changed(
        &mut self,
        target: FramebufferTarget,
        framebuffer: u32,
    ) -> BoundaryOutcome {
        self.profiler.on_framebuffer_change(target, framebuffer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationReport {
    pub frames: u32,
    pub drain: DrainReport,
}

pub struct BenchmarkDriver<R> {
    replay: R,
    frames: Range<u32>,
}

impl<R> BenchmarkDriver<R> {
    /// Wrap `replay`, rejecting an empty frame range up front.
    pub fn new<B, H>(replay: R) -> Result<Self>
    where
        B: TimestampQueryBackend,
        H: HostClock,
        R: TraceReplay<B, H>,
    {
        let frames = replay.frame_range();
        if frames.end <= frames.start {
            return Err(ProfilerError::EmptyFrameRange {
                start: frames.start,
                end: frames.end,
            });
        }
        Ok(Self { replay, frames })
    }

    pub fn frames(&self) -> Range<u32> {
        self.frames.clone()
    }

    pub fn replay(&self) -> &R {
        &self.replay
    }

    pub fn into_replay(self) -> R {
        self.replay
    }

    /// One pass over the frame range: sample the clocks, replay every frame
    /// inside a `"Frame {n}"` host event, then harvest finished GPU results.
    pub fn run_iteration<B, H>(&mut self, profiler: &mut GpuProfiler<B, H>) -> Result<IterationReport>
    where
        B: TimestampQueryBackend,
        H: HostClock,
        R: TraceReplay<B, H>,
    {
        profiler.on_iteration_start();

        for frame in self.frames.clone() {
            let label = format!("Frame {frame}");
            profiler.begin_host_event(&label);
            let mut ctx = FrameContext::new(profiler);
            self.replay
                .replay_frame(frame, &mut ctx)
                .map_err(|source| ProfilerError::Replay { frame, source })?;
            self.replay.swap(&mut ctx);
            profiler.end_host_event(&label);
        }

        let drain = profiler.on_iteration_end();
        Ok(IterationReport {
            frames: self.frames.end - self.frames.start,
            drain,
        })
    }

    pub fn run<B, H>(
        &mut self,
        profiler: &mut GpuProfiler<B, H>,
        iterations: usize,
    ) -> Result<Vec<IterationReport>>
    where
        B: TimestampQueryBackend,
        H: HostClock,
        R: TraceReplay<B, H>,
    {
        let mut reports = Vec::with_capacity(iterations);
        for iteration in 0..iterations {
            let report = self.run_iteration(profiler)?;
            tracing::debug!(
                iteration,
                resolved = report.drain.resolved,
                still_pending = report.drain.still_pending,
                "benchmark iteration complete"
            );
            reports.push(report);
        }
        Ok(reports)
    }
}

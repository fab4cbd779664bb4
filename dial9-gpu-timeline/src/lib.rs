#![doc = include_str!("../README.md")]

pub mod replay;
pub mod state_sync;
pub mod telemetry;

pub use replay::{BenchmarkDriver, FrameContext, IterationReport, ReplayError, TraceReplay};
pub use telemetry::{
    FramebufferTarget, GpuProfiler, GpuTimeline, ProfilerConfig, ProfilerError, TeardownPolicy,
    TimestampQueryBackend,
};

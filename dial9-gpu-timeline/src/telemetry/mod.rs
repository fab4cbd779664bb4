pub mod analysis;
pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
mod label_intern;
pub mod pending;
pub mod query;
pub mod recorder;
pub mod simulated;
pub mod timeline;
pub mod writer;

pub use analysis::{LabelStats, TraceAnalysis, TraceReader, analyze_trace, print_analysis};
pub use backend::{QueryId, TimestampQueryBackend};
pub use clock::{ClockSampler, HostClock, MonotonicClock, TimeSample};
pub use config::{ProfilerConfig, TeardownPolicy};
pub use error::{ProfilerError, Result};
pub use events::{EventSource, TraceEvent};
pub use pending::{DrainReport, PendingSet, ResolvedBracket};
pub use query::{BoundaryKey, BoundaryOutcome, BracketTracker, FramebufferTarget};
pub use recorder::{GpuProfiler, GpuProfilerBuilder, GpuTimeline, ProfilerStats};
pub use simulated::{SimulatedClock, SimulatedGpu};
pub use timeline::Timeline;
pub use writer::{ChromeTraceWriter, NullWriter, SimpleBinaryWriter, TraceWriter};

use thiserror::Error;

/// Errors surfaced to whoever builds and drives the profiler.
///
/// Nothing in the per-frame profiling path returns these: timing problems
/// only ever degrade the trace, never the replayed workload.
#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error("trace I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid profiler configuration: {0}")]
    InvalidConfig(String),

    #[error("replay frame range {start}..{end} is empty")]
    EmptyFrameRange { start: u32, end: u32 },

    #[error("replay of frame {frame} failed: {source}")]
    Replay {
        frame: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("vertex array state sync failed: {0}")]
    StateSync(String),
}

pub type Result<T> = std::result::Result<T, ProfilerError>;

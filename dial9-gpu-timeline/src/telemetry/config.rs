use crate::telemetry::error::{ProfilerError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to query handles still outstanding when the profiler shuts
/// down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum TeardownPolicy {
    /// Release every outstanding handle without reading it.
    Discard,
    /// Close the open bracket and keep draining until everything resolved or
    /// `timeout_ms` elapsed, then release whatever is left.
    ///
    /// Shutdown runs on drop, so dropping the profiler (including during a
    /// panic unwind) can block the calling thread for up to `timeout_ms`.
    Drain { timeout_ms: u64 },
}

impl Default for TeardownPolicy {
    fn default() -> Self {
        TeardownPolicy::Drain { timeout_ms: 100 }
    }
}

impl TeardownPolicy {
    pub fn drain_timeout(&self) -> Option<Duration> {
        match self {
            TeardownPolicy::Discard => None,
            TeardownPolicy::Drain { timeout_ms } => Some(Duration::from_millis(*timeout_ms)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Master switch. A disabled profiler behaves like one on a backend
    /// without timestamp queries.
    pub enabled: bool,
    /// Pending brackets above this count mean the GPU is falling behind.
    pub pending_warn_threshold: usize,
    pub teardown: TeardownPolicy,
    /// Sleep between drain passes during a [`TeardownPolicy::Drain`].
    pub teardown_poll_interval_us: u64,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pending_warn_threshold: 64,
            teardown: TeardownPolicy::default(),
            teardown_poll_interval_us: 500,
        }
    }
}

impl ProfilerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.pending_warn_threshold == 0 {
            return Err(ProfilerError::InvalidConfig(
                "pending_warn_threshold must be at least 1".to_string(),
            ));
        }
        if let TeardownPolicy::Drain { timeout_ms } = self.teardown
            && timeout_ms > 0
            && self.teardown_poll_interval_us > timeout_ms * 1000
        {
            return Err(ProfilerError::InvalidConfig(format!(
                "teardown poll interval ({}us) exceeds the drain timeout ({timeout_ms}ms)",
                self.teardown_poll_interval_us
            )));
        }
        Ok(())
    }

    pub fn teardown_poll_interval(&self) -> Duration {
        Duration::from_micros(self.teardown_poll_interval_us)
    }
}

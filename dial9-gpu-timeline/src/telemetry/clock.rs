use crate::telemetry::backend::TimestampQueryBackend;
use crate::telemetry::timeline::Timeline;

/// A (GPU clock, host clock) pair read at effectively the same instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// GPU clock ticks, treated as nanoseconds.
    pub gpu_time: i64,
    /// Host monotonic clock in seconds.
    pub host_time: f64,
}

/// Source of host timestamps. All host-side trace events and all converted
/// GPU events are expressed in this clock's domain.
pub trait HostClock {
    fn now_seconds(&self) -> f64;
}

/// `CLOCK_MONOTONIC`, reported as seconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin_ns: u64,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin_ns: clock_monotonic_ns(),
        }
    }
}

impl HostClock for MonotonicClock {
    fn now_seconds(&self) -> f64 {
        clock_monotonic_ns().saturating_sub(self.origin_ns) as f64 / 1e9
    }
}

pub(crate) fn clock_monotonic_ns() -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, initialized timespec on the stack.
    // CLOCK_MONOTONIC is always available on Linux and always succeeds.
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
    }
    ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64
}

/// Takes correlated samples and appends them to a [`Timeline`].
pub struct ClockSampler<H> {
    host_clock: H,
    samples_taken: u64,
}

impl<H: HostClock> ClockSampler<H> {
    pub fn new(host_clock: H) -> Self {
        Self {
            host_clock,
            samples_taken: 0,
        }
    }

    pub fn host_clock(&self) -> &H {
        &self.host_clock
    }

    pub fn samples_taken(&self) -> u64 {
        self.samples_taken
    }

    /// Read the GPU clock, then the host clock, with nothing in between.
    pub fn sample<B: TimestampQueryBackend + ?Sized>(&mut self, backend: &mut B) -> TimeSample {
        // The extended entry point is not exported by every driver; fall back
        // to the core one.
        let gpu_time = match backend.get_timestamp_ext() {
            Some(t) => t,
            None => backend.get_timestamp(),
        };
        let host_time = self.host_clock.now_seconds();
        self.samples_taken += 1;
        TimeSample {
            gpu_time,
            host_time,
        }
    }

    /// Sample and append to `timeline`.
    pub fn sample_into<B: TimestampQueryBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        timeline: &mut Timeline,
    ) -> TimeSample {
        let sample = self.sample(backend);
        timeline.push(sample);
        sample
    }
}

use dial9_gpu_timeline::telemetry::config::TeardownPolicy;
use dial9_gpu_timeline::telemetry::events::TraceEvent;
use dial9_gpu_timeline::telemetry::recorder::{GpuProfiler, GpuTimeline};
use dial9_gpu_timeline::telemetry::simulated::{SimulatedClock, SimulatedGpu};
use dial9_gpu_timeline::telemetry::writer::TraceWriter;
use std::sync::{Arc, Mutex};

/// A [`TraceWriter`] that accumulates all events into a shared `Vec`.
///
/// Construct with [`CapturingWriter::new`] and keep the returned
/// `Arc<Mutex<Vec<TraceEvent>>>` to inspect the captured events after the
/// profiler has been shut down or dropped.
#[allow(dead_code)]
pub struct CapturingWriter(Arc<Mutex<Vec<TraceEvent>>>);

impl CapturingWriter {
    /// Create a new writer and return a handle to the shared event buffer.
    pub fn new() -> (Self, Arc<Mutex<Vec<TraceEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (Self(events.clone()), events)
    }
}

impl TraceWriter for CapturingWriter {
    fn write_event(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn write_batch(&mut self, events: &[TraceEvent]) -> std::io::Result<()> {
        self.0.lock().unwrap().extend_from_slice(events);
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A profiler over a fresh simulated GPU whose host clock is the shared
/// simulated clock.
#[allow(dead_code)]
pub fn simulated_profiler(
    gpu: impl FnOnce(SimulatedClock) -> SimulatedGpu,
    teardown: TeardownPolicy,
) -> (
    GpuProfiler<SimulatedGpu, SimulatedClock>,
    SimulatedClock,
    Arc<Mutex<Vec<TraceEvent>>>,
) {
    let clock = SimulatedClock::new();
    let (writer, events) = CapturingWriter::new();
    let profiler = GpuTimeline::builder()
        .with_host_clock(clock.clone())
        .with_teardown(teardown)
        .build(gpu(clock.clone()), Box::new(writer))
        .unwrap();
    (profiler, clock, events)
}

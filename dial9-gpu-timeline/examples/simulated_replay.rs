//! Dry run of the benchmark loop against the simulated GPU.
//!
//! Usage:
//!   cargo run --example simulated_replay -- [output.bin]

use dial9_gpu_timeline::replay::{BenchmarkDriver, FrameContext, ReplayError, TraceReplay};
use dial9_gpu_timeline::telemetry::{
    FramebufferTarget, GpuTimeline, SimpleBinaryWriter, SimulatedClock, SimulatedGpu,
    TraceReader, analyze_trace, print_analysis,
};
use std::ops::Range;

/// Shadow pass, main pass, then a post-process pass into the default
/// framebuffer.
struct ThreePassFrame;

impl TraceReplay<SimulatedGpu, SimulatedClock> for ThreePassFrame {
    fn frame_range(&self) -> Range<u32> {
        0..60
    }

    fn replay_frame(
        &mut self,
        frame: u32,
        ctx: &mut FrameContext<'_, SimulatedGpu, SimulatedClock>,
    ) -> Result<(), ReplayError> {
        ctx.framebuffer_changed(FramebufferTarget::DrawFramebuffer, 1);
        ctx.backend_mut().submit_work(1_500_000);
        ctx.framebuffer_changed(FramebufferTarget::DrawFramebuffer, 2);
        ctx.backend_mut()
            .submit_work(6_000_000 + u64::from(frame % 7) * 250_000);
        ctx.framebuffer_changed(FramebufferTarget::ReadFramebuffer, 2);
        ctx.framebuffer_changed(FramebufferTarget::Framebuffer, 0);
        ctx.backend_mut().submit_work(800_000);
        Ok(())
    }

    fn swap(&mut self, ctx: &mut FrameContext<'_, SimulatedGpu, SimulatedClock>) {
        ctx.backend_mut().clock().advance_nanos(200_000);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "gpu_timeline.bin".to_string());

    let clock = SimulatedClock::new();
    let gpu = SimulatedGpu::new(clock.clone())
        .with_gpu_offset(1_000_000_000)
        .with_result_latency(2);
    let mut profiler = GpuTimeline::builder()
        .with_host_clock(clock)
        .build(gpu, Box::new(SimpleBinaryWriter::new(&path)?))?;

    let mut driver = BenchmarkDriver::new(ThreePassFrame)?;
    for report in driver.run(&mut profiler, 5)? {
        println!(
            "iteration: {} frames, {} brackets resolved, {} still pending",
            report.frames, report.drain.resolved, report.drain.still_pending
        );
    }
    let stats = profiler.shutdown();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    drop(profiler);

    let mut reader = TraceReader::new(&path)?;
    reader.read_header()?;
    let events = reader.read_all()?;
    print_analysis(&analyze_trace(&events));
    Ok(())
}

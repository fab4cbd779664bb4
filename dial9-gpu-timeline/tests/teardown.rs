mod common;

use common::simulated_profiler;
use dial9_gpu_timeline::telemetry::{
    FramebufferTarget, GpuProfiler, SimulatedClock, SimulatedGpu, TeardownPolicy,
};
use std::time::{Duration, Instant};

fn issue_brackets(profiler: &mut GpuProfiler<SimulatedGpu, SimulatedClock>, count: u32) {
    profiler.on_iteration_start();
    for fb in 0..count {
        profiler.on_framebuffer_change(FramebufferTarget::Framebuffer, fb);
        profiler.backend_mut().submit_work(1_000);
    }
}

#[test]
fn discard_releases_every_handle_unread() {
    let (mut profiler, _clock, events) = simulated_profiler(
        |clock| SimulatedGpu::new(clock).with_result_latency(u32::MAX),
        TeardownPolicy::Discard,
    );
    issue_brackets(&mut profiler, 4);
    assert_eq!(profiler.pending().len(), 3);
    assert!(profiler.open_bracket().is_some());

    let stats = profiler.shutdown();
    assert!(!profiler.is_active());
    assert_eq!(stats.abandoned_brackets, 4);
    assert_eq!(stats.brackets_resolved, 0);

    let gpu = profiler.backend();
    assert_eq!(gpu.live_queries(), 0);
    assert_eq!(gpu.results_read(), 0);
    assert_eq!(gpu.queries_deleted(), gpu.queries_generated());
    assert_eq!(gpu.invalid_deletes(), 0);
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn drain_resolves_ready_brackets_including_the_open_one() {
    let (mut profiler, _clock, events) = simulated_profiler(
        |clock| SimulatedGpu::new(clock).with_result_latency(3),
        TeardownPolicy::Drain { timeout_ms: 1_000 },
    );
    issue_brackets(&mut profiler, 4);

    let stats = profiler.shutdown();
    assert_eq!(stats.brackets_resolved, 4);
    assert_eq!(stats.abandoned_brackets, 0);
    assert_eq!(profiler.backend().live_queries(), 0);
    assert_eq!(events.lock().unwrap().len(), 8);
}

#[test]
fn drain_gives_up_at_the_deadline() {
    let (mut profiler, _clock, _events) = simulated_profiler(
        |clock| SimulatedGpu::new(clock).with_result_latency(u32::MAX),
        TeardownPolicy::Drain { timeout_ms: 20 },
    );
    issue_brackets(&mut profiler, 3);

    let start = Instant::now();
    let stats = profiler.shutdown();
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert_eq!(stats.brackets_resolved, 0);
    assert_eq!(stats.abandoned_brackets, 3);
    assert_eq!(profiler.backend().live_queries(), 0);
}

#[test]
fn shutdown_is_idempotent() {
    let (mut profiler, _clock, _events) = simulated_profiler(SimulatedGpu::new, TeardownPolicy::default());
    issue_brackets(&mut profiler, 2);

    let first = profiler.shutdown();
    let second = profiler.shutdown();
    assert_eq!(first, second);
    assert_eq!(profiler.backend().invalid_deletes(), 0);

    // Hooks after shutdown are no-ops.
    profiler.on_framebuffer_change(FramebufferTarget::Framebuffer, 7);
    profiler.on_iteration_start();
    assert_eq!(profiler.stats(), second);
}

#[test]
fn drop_blocks_up_to_the_drain_timeout() {
    let (mut profiler, _clock, _events) = simulated_profiler(
        |clock| SimulatedGpu::new(clock).with_result_latency(u32::MAX),
        TeardownPolicy::Drain { timeout_ms: 20 },
    );
    issue_brackets(&mut profiler, 2);

    let start = Instant::now();
    drop(profiler);
    assert!(start.elapsed() >= Duration::from_millis(20));
}

#[test]
fn drop_applies_the_policy() {
    let (mut profiler, _clock, events) = simulated_profiler(SimulatedGpu::new, TeardownPolicy::default());
    issue_brackets(&mut profiler, 3);
    drop(profiler);
    // Two brackets closed during the run plus the one closed at teardown.
    assert_eq!(events.lock().unwrap().len(), 6);
}

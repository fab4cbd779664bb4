use assert2::check;
use dial9_gpu_timeline::telemetry::{EventSource, TraceAnalysis, TraceEvent};

/// Structural checks every emitted trace must pass: markers pair up per
/// label, no GPU interval runs backwards, and GPU intervals are laid out in
/// emission order without overlapping.
pub fn validate_trace(analysis: &TraceAnalysis, events: &[TraceEvent]) {
    check!(analysis.total_events == events.len());
    check!(analysis.unmatched_ends == 0);
    check!(analysis.unclosed_begins == 0);

    let gpu: Vec<&TraceEvent> = events
        .iter()
        .filter(|e| e.source() == EventSource::Gpu)
        .collect();
    check!(gpu.len() % 2 == 0, "GPU markers come in pairs");

    let mut prev_end = f64::NEG_INFINITY;
    for pair in gpu.chunks(2) {
        let (begin, end) = (pair[0], pair[1]);
        check!(begin.is_begin());
        check!(!end.is_begin());
        check!(begin.label() == end.label());
        check!(end.host_time_secs() >= begin.host_time_secs());
        check!(
            begin.host_time_secs() >= prev_end - 1e-12,
            "bracket {} starts before the previous one ended",
            begin.label()
        );
        prev_end = end.host_time_secs();
    }

    for ((source, label), stats) in &analysis.label_stats {
        eprintln!(
            "  {source:?} {label}: count={} total={:.6}s max={:.6}s",
            stats.count, stats.total_secs, stats.max_secs
        );
        check!(stats.max_secs <= stats.total_secs + 1e-12);
    }
}

use crate::telemetry::events::{EventSource, LabelId, TraceEvent, WireEvent, nanos_to_secs};
use crate::telemetry::format;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Error, ErrorKind, Result};

pub struct TraceReader {
    reader: BufReader<File>,
    /// Label definitions accumulated during reading.
    pub labels: HashMap<LabelId, String>,
}

impl TraceReader {
    pub fn new(path: &str) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            labels: HashMap::new(),
        })
    }

    pub fn read_header(&mut self) -> Result<(String, u32)> {
        format::read_header(&mut self.reader)
    }

    /// Read the next wire record without resolving labels. Still accumulates
    /// label definitions as a side effect.
    pub fn read_raw_event(&mut self) -> Result<Option<WireEvent>> {
        let event = format::read_event(&mut self.reader)?;
        if let Some(WireEvent::LabelDef { id, label }) = &event {
            self.labels.insert(*id, label.clone());
        }
        Ok(event)
    }

    /// Read the next begin/end marker with its label resolved.
    pub fn read_event(&mut self) -> Result<Option<TraceEvent>> {
        loop {
            match format::read_event(&mut self.reader)? {
                None => return Ok(None),
                Some(WireEvent::LabelDef { id, label }) => {
                    self.labels.insert(id, label);
                }
                Some(WireEvent::Begin {
                    host_time_nanos,
                    source,
                    label_id,
                }) => {
                    let label = self.label(label_id)?;
                    return Ok(Some(TraceEvent::begin(
                        label,
                        nanos_to_secs(host_time_nanos),
                        source,
                    )));
                }
                Some(WireEvent::End {
                    host_time_nanos,
                    source,
                    label_id,
                }) => {
                    let label = self.label(label_id)?;
                    return Ok(Some(TraceEvent::end(
                        label,
                        nanos_to_secs(host_time_nanos),
                        source,
                    )));
                }
            }
        }
    }

    pub fn read_all(&mut self) -> Result<Vec<TraceEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.read_event()? {
            events.push(event);
        }
        Ok(events)
    }

    fn label(&self, id: LabelId) -> Result<String> {
        self.labels.get(&id).cloned().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidData,
                format!("label {} referenced before its definition", id.as_u16()),
            )
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LabelStats {
    pub count: usize,
    pub total_secs: f64,
    pub max_secs: f64,
}

impl LabelStats {
    pub fn mean_secs(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_secs / self.count as f64
        }
    }
}

#[derive(Debug)]
pub struct TraceAnalysis {
    pub total_events: usize,
    /// Host seconds between the earliest and latest event.
    pub span_secs: f64,
    pub label_stats: HashMap<(EventSource, String), LabelStats>,
    /// End markers with no open begin for the same label.
    pub unmatched_ends: usize,
    /// Begin markers still open at the end of the trace.
    pub unclosed_begins: usize,
}

impl TraceAnalysis {
    pub fn stats(&self, source: EventSource, label: &str) -> Option<&LabelStats> {
        self.label_stats.get(&(source, label.to_string()))
    }
}

/// Pair begin/end markers per (source, label) and accumulate durations.
/// Markers with the same label nest.
pub fn analyze_trace(events: &[TraceEvent]) -> TraceAnalysis {
    let mut open: HashMap<(EventSource, &str), Vec<f64>> = HashMap::new();
    let mut label_stats: HashMap<(EventSource, String), LabelStats> = HashMap::new();
    let mut unmatched_ends = 0;
    let mut min_t = f64::INFINITY;
    let mut max_t = f64::NEG_INFINITY;

    for event in events {
        let t = event.host_time_secs();
        min_t = min_t.min(t);
        max_t = max_t.max(t);
        let key = (event.source(), event.label());
        match event {
            TraceEvent::Begin { .. } => open.entry(key).or_default().push(t),
            TraceEvent::End { .. } => match open.get_mut(&key).and_then(|stack| stack.pop()) {
                Some(begin) => {
                    let duration = (t - begin).max(0.0);
                    let stats = label_stats
                        .entry((key.0, key.1.to_string()))
                        .or_default();
                    stats.count += 1;
                    stats.total_secs += duration;
                    stats.max_secs = stats.max_secs.max(duration);
                }
                None => unmatched_ends += 1,
            },
        }
    }

    TraceAnalysis {
        total_events: events.len(),
        span_secs: if events.is_empty() { 0.0 } else { max_t - min_t },
        label_stats,
        unmatched_ends,
        unclosed_begins: open.values().map(Vec::len).sum(),
    }
}

pub fn print_analysis(analysis: &TraceAnalysis) {
    println!("=== GPU Timeline Analysis ===");
    println!("Total events: {}", analysis.total_events);
    println!("Span: {:.3} ms", analysis.span_secs * 1e3);
    if analysis.unmatched_ends > 0 || analysis.unclosed_begins > 0 {
        println!(
            "Unpaired markers: {} unmatched ends, {} unclosed begins",
            analysis.unmatched_ends, analysis.unclosed_begins
        );
    }

    let mut rows: Vec<_> = analysis.label_stats.iter().collect();
    rows.sort_by(|a, b| b.1.total_secs.total_cmp(&a.1.total_secs));
    println!(
        "\n{:<6} {:<24} {:>8} {:>12} {:>12} {:>12}",
        "Source", "Label", "Count", "Total ms", "Mean ms", "Max ms"
    );
    for ((source, label), stats) in rows {
        let source = match source {
            EventSource::Host => "host",
            EventSource::Gpu => "gpu",
        };
        println!(
            "{:<6} {:<24} {:>8} {:>12.3} {:>12.3} {:>12.3}",
            source,
            label,
            stats.count,
            stats.total_secs * 1e3,
            stats.mean_secs() * 1e3,
            stats.max_secs * 1e3
        );
    }
}

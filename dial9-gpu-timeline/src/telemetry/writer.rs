use crate::telemetry::events::{EventSource, TraceEvent};
use crate::telemetry::format;
use crate::telemetry::label_intern::LabelInterner;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sink for trace events produced by the profiler and the driver.
pub trait TraceWriter: Send {
    fn write_event(&mut self, event: &TraceEvent) -> std::io::Result<()>;
    fn write_batch(&mut self, events: &[TraceEvent]) -> std::io::Result<()> {
        for event in events {
            self.write_event(event)?;
        }
        Ok(())
    }
    fn flush(&mut self) -> std::io::Result<()>;
}

impl<W: TraceWriter + ?Sized> TraceWriter for Box<W> {
    fn write_event(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        (**self).write_event(event)
    }
    fn write_batch(&mut self, events: &[TraceEvent]) -> std::io::Result<()> {
        (**self).write_batch(events)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        (**self).flush()
    }
}

/// Writes the binary format described in [`format`](crate::telemetry::format).
pub struct SimpleBinaryWriter {
    writer: BufWriter<File>,
    labels: LabelInterner,
    bytes_written: u64,
}

impl SimpleBinaryWriter {
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        format::write_header(&mut writer)?;
        Ok(Self {
            writer,
            labels: LabelInterner::new(),
            bytes_written: format::HEADER_SIZE as u64,
        })
    }

    /// Bytes handed to the file so far, including the header.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl TraceWriter for SimpleBinaryWriter {
    fn write_event(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        for wire in self.labels.resolve(event)? {
            format::write_event(&mut self.writer, &wire)?;
            self.bytes_written += format::wire_event_size(&wire) as u64;
        }
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// A writer that discards all events. Useful for measuring profiler overhead
/// without I/O costs.
pub struct NullWriter;

impl TraceWriter for NullWriter {
    fn write_event(&mut self, _event: &TraceEvent) -> std::io::Result<()> {
        Ok(())
    }
    fn write_batch(&mut self, _events: &[TraceEvent]) -> std::io::Result<()> {
        Ok(())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChromeEvent {
    name: String,
    cat: &'static str,
    ph: &'static str,
    /// Microseconds.
    ts: f64,
    pid: u32,
    tid: u32,
}

#[derive(Serialize)]
struct ChromeTrace<'a> {
    #[serde(rename = "traceEvents")]
    events: &'a [ChromeEvent],
    #[serde(rename = "displayTimeUnit")]
    display_time_unit: &'static str,
}

/// Writes the Chrome trace-event JSON format (`chrome://tracing`, Perfetto).
///
/// Host events go on thread 0 and GPU events on thread 1 so the two
/// timelines render as separate tracks. The file is rewritten in full on
/// every `flush`.
pub struct ChromeTraceWriter {
    path: PathBuf,
    events: Vec<ChromeEvent>,
}

impl ChromeTraceWriter {
    pub fn new(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        // Fail early on an unwritable path rather than at the first flush.
        File::create(&path)?;
        Ok(Self {
            path,
            events: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl TraceWriter for ChromeTraceWriter {
    fn write_event(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        let (cat, tid) = match event.source() {
            EventSource::Host => ("host", 0),
            EventSource::Gpu => ("gpu", 1),
        };
        self.events.push(ChromeEvent {
            name: event.label().to_string(),
            cat,
            ph: if event.is_begin() { "B" } else { "E" },
            ts: event.host_time_secs() * 1e6,
            pid: std::process::id(),
            tid,
        });
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        let trace = ChromeTrace {
            events: &self.events,
            display_time_unit: "ms",
        };
        serde_json::to_writer(&mut writer, &trace)?;
        writer.flush()
    }
}

use crate::telemetry::events::TraceEvent;
use crate::telemetry::writer::TraceWriter;

/// Intermediate layer between the profiler and the raw `TraceWriter`.
///
/// A failing writer is logged once and then dropped: trace output stops but
/// profiling (and the replay it observes) carries on.
pub(super) struct EventWriter {
    writer: Option<Box<dyn TraceWriter>>,
    pub(super) events_written: u64,
    pub(super) write_errors: u64,
}

impl EventWriter {
    pub(super) fn new(writer: Box<dyn TraceWriter>) -> Self {
        Self {
            writer: Some(writer),
            events_written: 0,
            write_errors: 0,
        }
    }

    pub(super) fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub(super) fn write(&mut self, event: &TraceEvent) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        match writer.write_event(event) {
            Ok(()) => self.events_written += 1,
            Err(e) => self.disable(e),
        }
    }

    pub(super) fn flush(&mut self) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        if let Err(e) = writer.flush() {
            self.disable(e);
        }
    }

    fn disable(&mut self, error: std::io::Error) {
        self.write_errors += 1;
        self.writer = None;
        tracing::warn!(%error, "trace writer failed; disabling trace output");
    }
}

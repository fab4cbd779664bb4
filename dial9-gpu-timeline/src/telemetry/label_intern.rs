use crate::telemetry::events::{LabelId, TraceEvent, WireEvent, secs_to_nanos};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::io::{Error, ErrorKind, Result};

/// Writer-side label interning. Each writer owns one file, so a label needs
/// its `LabelDef` exactly once: when it is first interned.
pub(crate) struct LabelInterner {
    ids: HashMap<String, LabelId>,
}

impl LabelInterner {
    pub(crate) fn new() -> Self {
        Self {
            ids: HashMap::new(),
        }
    }

    /// Returns the label's id and whether it was newly assigned.
    pub(crate) fn intern(&mut self, label: &str) -> Result<(LabelId, bool)> {
        if let Some(&id) = self.ids.get(label) {
            return Ok((id, false));
        }
        let id = u16::try_from(self.ids.len())
            .map(LabelId)
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "too many distinct trace labels"))?;
        self.ids.insert(label.to_string(), id);
        Ok((id, true))
    }

    /// Resolve an event into wire records: its label def first if the label
    /// is new, then the marker itself.
    pub(crate) fn resolve(&mut self, event: &TraceEvent) -> Result<SmallVec<[WireEvent; 2]>> {
        let (label_id, is_new) = self.intern(event.label())?;
        let mut out = SmallVec::new();
        if is_new {
            out.push(WireEvent::LabelDef {
                id: label_id,
                label: event.label().to_string(),
            });
        }
        let host_time_nanos = secs_to_nanos(event.host_time_secs());
        let source = event.source();
        out.push(match event {
            TraceEvent::Begin { .. } => WireEvent::Begin {
                host_time_nanos,
                source,
                label_id,
            },
            TraceEvent::End { .. } => WireEvent::End {
                host_time_nanos,
                source,
                label_id,
            },
        });
        Ok(out)
    }
}

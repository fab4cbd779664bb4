use serde::Serialize;

/// Which clock produced an event's timestamp before it landed on the host
/// timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    /// Read directly from the host clock (frame markers).
    Host,
    /// A GPU timestamp converted through the timeline.
    Gpu,
}

impl EventSource {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            EventSource::Host => 0,
            EventSource::Gpu => 1,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(EventSource::Host),
            1 => Some(EventSource::Gpu),
            _ => None,
        }
    }
}

/// Interned label id used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LabelId(pub(crate) u16);

impl LabelId {
    pub fn from_u16(id: u16) -> Self {
        LabelId(id)
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }
}

/// A begin or end marker on the host timeline. Begin/end pairs share a label.
///
/// NOTE: the `Serialize` impl is for JSON output only. It does NOT reflect
/// the binary wire format, which interns labels (see [`WireEvent`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    Begin {
        label: String,
        #[serde(rename = "host_time_s")]
        host_time_secs: f64,
        source: EventSource,
    },
    End {
        label: String,
        #[serde(rename = "host_time_s")]
        host_time_secs: f64,
        source: EventSource,
    },
}

impl TraceEvent {
    pub fn begin(label: impl Into<String>, host_time_secs: f64, source: EventSource) -> Self {
        TraceEvent::Begin {
            label: label.into(),
            host_time_secs,
            source,
        }
    }

    pub fn end(label: impl Into<String>, host_time_secs: f64, source: EventSource) -> Self {
        TraceEvent::End {
            label: label.into(),
            host_time_secs,
            source,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TraceEvent::Begin { label, .. } | TraceEvent::End { label, .. } => label,
        }
    }

    pub fn host_time_secs(&self) -> f64 {
        match self {
            TraceEvent::Begin { host_time_secs, .. } | TraceEvent::End { host_time_secs, .. } => {
                *host_time_secs
            }
        }
    }

    pub fn source(&self) -> EventSource {
        match self {
            TraceEvent::Begin { source, .. } | TraceEvent::End { source, .. } => *source,
        }
    }

    pub fn is_begin(&self) -> bool {
        matches!(self, TraceEvent::Begin { .. })
    }
}

/// Binary-format record. Compare with [`TraceEvent`], which carries the label
/// string inline; on the wire each label is defined once per file by a
/// `LabelDef` and then referenced by id.
#[derive(Debug, Clone, PartialEq)]
pub enum WireEvent {
    LabelDef {
        id: LabelId,
        label: String,
    },
    Begin {
        host_time_nanos: u64,
        source: EventSource,
        label_id: LabelId,
    },
    End {
        host_time_nanos: u64,
        source: EventSource,
        label_id: LabelId,
    },
}

/// Host seconds → whole nanoseconds for the wire. Negative times clamp to 0.
pub(crate) fn secs_to_nanos(secs: f64) -> u64 {
    if secs <= 0.0 {
        0
    } else {
        (secs * 1e9).round() as u64
    }
}

pub(crate) fn nanos_to_secs(nanos: u64) -> f64 {
    nanos as f64 / 1e9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let begin = TraceEvent::begin("FBO 3", 1.25, EventSource::Gpu);
        assert_eq!(begin.label(), "FBO 3");
        assert_eq!(begin.host_time_secs(), 1.25);
        assert_eq!(begin.source(), EventSource::Gpu);
        assert!(begin.is_begin());

        let end = TraceEvent::end("Frame 0", 2.0, EventSource::Host);
        assert!(!end.is_begin());
        assert_eq!(end.source(), EventSource::Host);
    }

    #[test]
    fn test_source_codes() {
        for source in [EventSource::Host, EventSource::Gpu] {
            assert_eq!(EventSource::from_u8(source.as_u8()), Some(source));
        }
        assert_eq!(EventSource::from_u8(7), None);
    }

    #[test]
    fn test_json_shape() {
        let event = TraceEvent::begin("FBO 1", 0.5, EventSource::Gpu);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "Begin");
        assert_eq!(json["label"], "FBO 1");
        assert_eq!(json["host_time_s"], 0.5);
        assert_eq!(json["source"], "gpu");
    }

    #[test]
    fn test_secs_to_nanos() {
        assert_eq!(secs_to_nanos(1.5), 1_500_000_000);
        assert_eq!(secs_to_nanos(-3.0), 0);
        assert_eq!(nanos_to_secs(250_000_000), 0.25);
    }
}

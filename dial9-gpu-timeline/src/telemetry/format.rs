//! Binary trace wire format (v1).
//!
//! ## File layout
//! ```text
//! Header:  MAGIC (8 bytes) + VERSION (u32 LE) = 12 bytes
//!
//! Wire codes:
//!   0: LabelDef → code(u8) + label_id(u16) + len(u16) + utf8 bytes(len)                = 5 + len bytes
//!   1: Begin    → code(u8) + source(u8) + label_id(u16) + host_time_ns(u64)             = 12 bytes
//!   2: End      → code(u8) + source(u8) + label_id(u16) + host_time_ns(u64)             = 12 bytes
//! ```
//!
//! Host times are nanoseconds on the profiler's host clock. A `LabelDef` for
//! an id always precedes the first `Begin`/`End` referencing it in the same
//! file.

use crate::telemetry::events::{EventSource, LabelId, WireEvent};
use std::io::{Error, ErrorKind, Read, Result, Write};

pub const MAGIC: &[u8; 8] = b"GPUTLINE";
pub const VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 12; // 8 magic + 4 version

const WIRE_LABEL_DEF: u8 = 0;
const WIRE_BEGIN: u8 = 1;
const WIRE_END: u8 = 2;

/// Longest label that fits the u16 length prefix.
pub const MAX_LABEL_LEN: usize = u16::MAX as usize;

pub fn wire_event_size(event: &WireEvent) -> usize {
    match event {
        WireEvent::LabelDef { label, .. } => 5 + label.len().min(MAX_LABEL_LEN),
        WireEvent::Begin { .. } | WireEvent::End { .. } => 12,
    }
}

pub fn write_header(w: &mut impl Write) -> Result<()> {
    w.write_all(MAGIC)?;
    w.write_all(&VERSION.to_le_bytes())
}

pub fn write_event(w: &mut impl Write, event: &WireEvent) -> Result<()> {
    match event {
        WireEvent::LabelDef { id, label } => {
            if label.len() > MAX_LABEL_LEN {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("label is {} bytes, max {MAX_LABEL_LEN}", label.len()),
                ));
            }
            w.write_all(&[WIRE_LABEL_DEF])?;
            w.write_all(&id.as_u16().to_le_bytes())?;
            w.write_all(&(label.len() as u16).to_le_bytes())?;
            w.write_all(label.as_bytes())?;
        }
        WireEvent::Begin {
            host_time_nanos,
            source,
            label_id,
        } => write_marker(w, WIRE_BEGIN, *source, *label_id, *host_time_nanos)?,
        WireEvent::End {
            host_time_nanos,
            source,
            label_id,
        } => write_marker(w, WIRE_END, *source, *label_id, *host_time_nanos)?,
    }
    Ok(())
}

fn write_marker(
    w: &mut impl Write,
    code: u8,
    source: EventSource,
    label_id: LabelId,
    host_time_nanos: u64,
) -> Result<()> {
    w.write_all(&[code, source.as_u8()])?;
    w.write_all(&label_id.as_u16().to_le_bytes())?;
    w.write_all(&host_time_nanos.to_le_bytes())
}

pub fn read_header(r: &mut impl Read) -> Result<(String, u32)> {
    let mut magic = [0u8; 8];
    r.read_exact(&mut magic)?;
    let mut version = [0u8; 4];
    r.read_exact(&mut version)?;
    Ok((
        String::from_utf8_lossy(&magic).to_string(),
        u32::from_le_bytes(version),
    ))
}

/// Read one event. Returns `Ok(None)` at EOF.
pub fn read_event(r: &mut impl Read) -> Result<Option<WireEvent>> {
    let mut tag = [0u8; 1];
    if r.read_exact(&mut tag).is_err() {
        return Ok(None);
    }

    match tag[0] {
        WIRE_LABEL_DEF => {
            let mut id = [0u8; 2];
            r.read_exact(&mut id)?;
            let mut len = [0u8; 2];
            r.read_exact(&mut len)?;
            let mut bytes = vec![0u8; u16::from_le_bytes(len) as usize];
            r.read_exact(&mut bytes)?;
            let label = String::from_utf8(bytes)
                .map_err(|_| Error::new(ErrorKind::InvalidData, "label is not utf8"))?;
            Ok(Some(WireEvent::LabelDef {
                id: LabelId::from_u16(u16::from_le_bytes(id)),
                label,
            }))
        }
        code @ (WIRE_BEGIN | WIRE_END) => {
            let mut src = [0u8; 1];
            r.read_exact(&mut src)?;
            let source = EventSource::from_u8(src[0]).ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidData,
                    format!("unknown event source {}", src[0]),
                )
            })?;
            let mut id = [0u8; 2];
            r.read_exact(&mut id)?;
            let mut ts = [0u8; 8];
            r.read_exact(&mut ts)?;
            let label_id = LabelId::from_u16(u16::from_le_bytes(id));
            let host_time_nanos = u64::from_le_bytes(ts);
            Ok(Some(if code == WIRE_BEGIN {
                WireEvent::Begin {
                    host_time_nanos,
                    source,
                    label_id,
                }
            } else {
                WireEvent::End {
                    host_time_nanos,
                    source,
                    label_id,
                }
            }))
        }
        other => Err(Error::new(
            ErrorKind::InvalidData,
            format!("unknown wire code {other}"),
        )),
    }
}

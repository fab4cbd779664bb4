//! Brackets GPU work between consecutive framebuffer changes with a pair of
//! timestamp queries.
//!
//! There is at most one open bracket. A framebuffer change ends the open
//! bracket (if any) and immediately begins a new one for the newly bound
//! framebuffer, so consecutive brackets tile the GPU timeline.

use crate::telemetry::backend::{QueryId, TimestampQueryBackend};

/// Binding point named by a framebuffer-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    Framebuffer,
    DrawFramebuffer,
    ReadFramebuffer,
    /// Any other notification kind, e.g. a capability probe.
    Other(u32),
}

impl FramebufferTarget {
    /// Only draw bindings change where rendering goes.
    pub fn is_draw_target(self) -> bool {
        matches!(
            self,
            FramebufferTarget::Framebuffer | FramebufferTarget::DrawFramebuffer
        )
    }
}

/// Identifier of the framebuffer a bracket measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundaryKey(pub u32);

impl BoundaryKey {
    /// Trace label shared by the begin/end events of this bracket.
    pub fn label(self) -> String {
        format!("FBO {}", self.0)
    }
}

/// A bracket whose begin timestamp has been issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenBracket {
    pub begin: QueryId,
    pub key: BoundaryKey,
}

/// A bracket with both timestamps issued, waiting for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedBracket {
    pub begin: QueryId,
    pub end: QueryId,
    pub key: BoundaryKey,
}

/// Outcome of feeding one notification to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryOutcome {
    /// Not a draw binding; nothing changed.
    Ignored,
    /// A new bracket was opened. `closed` is the bracket it replaced.
    Opened { closed: Option<ClosedBracket> },
}

#[derive(Debug, Default)]
pub struct BracketTracker {
    open: Option<OpenBracket>,
    opened: u64,
    closed: u64,
    ignored: u64,
}

impl BracketTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_bracket(&self) -> Option<&OpenBracket> {
        self.open.as_ref()
    }

    pub fn brackets_opened(&self) -> u64 {
        self.opened
    }

    pub fn brackets_closed(&self) -> u64 {
        self.closed
    }

    pub fn ignored_events(&self) -> u64 {
        self.ignored
    }

    pub fn on_framebuffer_change<B: TimestampQueryBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        target: FramebufferTarget,
        framebuffer: u32,
    ) -> BoundaryOutcome {
        if !target.is_draw_target() {
            self.ignored += 1;
            return BoundaryOutcome::Ignored;
        }

        let closed = self.close(backend);
        debug_assert!(self.open.is_none());

        let begin = backend.gen_query();
        backend.query_counter(begin);
        self.open = Some(OpenBracket {
            begin,
            key: BoundaryKey(framebuffer),
        });
        self.opened += 1;

        BoundaryOutcome::Opened { closed }
    }

    /// End the open bracket, if any, by issuing its end timestamp.
    pub fn close<B: TimestampQueryBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Option<ClosedBracket> {
        let open = self.open.take()?;
        let end = backend.gen_query();
        backend.query_counter(end);
        self.closed += 1;
        Some(ClosedBracket {
            begin: open.begin,
            end,
            key: open.key,
        })
    }

    /// Drop the open bracket without ending it, returning its begin handle
    /// so the caller can release it.
    pub fn abandon(&mut self) -> Option<OpenBracket> {
        self.open.take()
    }
}

use crate::telemetry::backend::TimestampQueryBackend;
use crate::telemetry::query::{BoundaryKey, ClosedBracket};

/// Raw GPU timestamps read back for one bracket. Both query handles have
/// already been returned to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBracket {
    pub key: BoundaryKey,
    pub begin_gpu_time: i64,
    pub end_gpu_time: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub resolved: usize,
    pub still_pending: usize,
}

/// Closed brackets whose results have not been read yet, oldest first.
#[derive(Debug, Default)]
pub struct PendingSet {
    brackets: Vec<ClosedBracket>,
    high_water: usize,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.brackets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }

    /// Largest size the set has reached.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClosedBracket> {
        self.brackets.iter()
    }

    /// Enqueue a closed bracket, returning the new size.
    pub fn push(&mut self, bracket: ClosedBracket) -> usize {
        self.brackets.push(bracket);
        self.high_water = self.high_water.max(self.brackets.len());
        self.brackets.len()
    }

    /// One non-blocking pass over the set.
    ///
    /// Brackets whose end result is available are read, their handles are
    /// deleted right away, and `on_resolved` is called in enqueue order. The
    /// rest stay for the next pass. The end query is polled because it was
    /// issued after the begin query, so its availability implies both.
    pub fn drain<B, F>(&mut self, backend: &mut B, mut on_resolved: F) -> DrainReport
    where
        B: TimestampQueryBackend + ?Sized,
        F: FnMut(&mut B, ResolvedBracket),
    {
        let mut resolved = 0;
        let mut index = 0;
        while index < self.brackets.len() {
            let bracket = self.brackets[index];
            if !backend.is_result_available(bracket.end) {
                index += 1;
                continue;
            }

            let begin_gpu_time = backend.query_result(bracket.begin);
            backend.delete_query(bracket.begin);
            let end_gpu_time = backend.query_result(bracket.end);
            backend.delete_query(bracket.end);
            self.brackets.remove(index);
            resolved += 1;

            on_resolved(
                &mut *backend,
                ResolvedBracket {
                    key: bracket.key,
                    begin_gpu_time,
                    end_gpu_time,
                },
            );
        }

        DrainReport {
            resolved,
            still_pending: self.brackets.len(),
        }
    }

    /// Delete every pending handle without reading it. Returns how many
    /// brackets were dropped.
    pub fn release_all<B: TimestampQueryBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        let dropped = self.brackets.len();
        for bracket in self.brackets.drain(..) {
            backend.delete_query(bracket.begin);
            backend.delete_query(bracket.end);
        }
        dropped
    }
}

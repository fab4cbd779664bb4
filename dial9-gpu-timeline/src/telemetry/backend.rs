//! The minimal GPU capability the profiler needs: issue a timestamp query,
//! poll it for availability, read it, and read the GPU clock directly.

/// Backend-allocated timestamp query handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(pub u32);

impl QueryId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Timestamp-query operations exposed by a graphics backend.
///
/// Every method is expected to return immediately. In particular
/// [`is_result_available`](Self::is_result_available) is an availability
/// check, not a wait, and [`query_result`](Self::query_result) is only called
/// after it reported `true`.
pub trait TimestampQueryBackend {
    /// Whether the backend can issue timestamp queries at all. Checked once
    /// when the profiler is built.
    fn supports_timestamp_queries(&self) -> bool;

    /// Read the current GPU clock through the extended entry point, if the
    /// backend exports it. Some drivers only expose the core entry point.
    fn get_timestamp_ext(&mut self) -> Option<i64> {
        None
    }

    /// Read the current GPU clock through the core entry point.
    fn get_timestamp(&mut self) -> i64;

    /// Allocate a new query handle.
    fn gen_query(&mut self) -> QueryId;

    /// Record a timestamp into `query` once all previously submitted GPU work
    /// has reached this point. Does not block.
    fn query_counter(&mut self, query: QueryId);

    fn is_result_available(&mut self, query: QueryId) -> bool;

    /// Read the raw GPU timestamp recorded by `query`.
    fn query_result(&mut self, query: QueryId) -> i64;

    /// Return `query` to the backend's allocator.
    fn delete_query(&mut self, query: QueryId);
}

impl<B: TimestampQueryBackend + ?Sized> TimestampQueryBackend for Box<B> {
    fn supports_timestamp_queries(&self) -> bool {
        (**self).supports_timestamp_queries()
    }

    fn get_timestamp_ext(&mut self) -> Option<i64> {
        (**self).get_timestamp_ext()
    }

    fn get_timestamp(&mut self) -> i64 {
        (**self).get_timestamp()
    }

    fn gen_query(&mut self) -> QueryId {
        (**self).gen_query()
    }

    fn query_counter(&mut self, query: QueryId) {
        (**self).query_counter(query)
    }

    fn is_result_available(&mut self, query: QueryId) -> bool {
        (**self).is_result_available(query)
    }

    fn query_result(&mut self, query: QueryId) -> i64 {
        (**self).query_result(query)
    }

    fn delete_query(&mut self, query: QueryId) {
        (**self).delete_query(query)
    }
}

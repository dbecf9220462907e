//! The external count-source collaborator.
//!
//! The upstream issue-search API is modeled as a trait returning one
//! non-negative count per query. Implementations live outside this
//! repository; closures implement the trait directly, which is what the
//! tests use.

use std::time::Duration;

use thiserror::Error;

use crate::query::SearchQuery;

/// Failure classes a count source can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source throttled the caller. Retryable after waiting; the
    /// source may supply a reset hint.
    #[error("rate limited by the count source")]
    RateLimited { retry_after: Option<Duration> },

    /// The source rejected the query expression. Not retryable; callers
    /// default the value to zero.
    #[error("query rejected as invalid")]
    InvalidQuery,

    /// Transient network or server failure. Retryable.
    #[error("count source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// Whether retrying the same query can ever help.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SourceError::InvalidQuery)
    }
}

/// External collaborator that resolves a query to a count.
pub trait CountSource {
    fn count(&mut self, query: &SearchQuery) -> Result<u64, SourceError>;
}

impl<F> CountSource for F
where
    F: FnMut(&SearchQuery) -> Result<u64, SourceError>,
{
    fn count(&mut self, query: &SearchQuery) -> Result<u64, SourceError> {
        self(query)
    }
}

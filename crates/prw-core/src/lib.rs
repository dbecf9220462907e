//! PR Watch core procedures.
//!
//! This crate wires the pure numeric policy (`prw-math`) and the row
//! table (`prw-series`) into the three maintenance procedures the
//! tracker needs:
//! - `backfill`: populate a newly introduced counter column across
//!   history from a sparse set of live samples
//! - `reconcile`: re-query one existing column where applicable and
//!   record an audit diff
//! - `enforce`: clamp each agent's nondraft counter into the
//!   `[merged, total]` band
//!
//! The upstream search index appears only as the `CountSource` trait;
//! no network implementation lives here.

pub mod backfill;
pub mod config;
pub mod enforce;
pub mod query;
pub mod reconcile;
pub mod retry;
pub mod source;

pub use backfill::{backfill_file, collect_samples, fill, BackfillOptions, BackfillOutcome, SampleSet};
pub use config::SourceConfig;
pub use enforce::{enforce_file, enforce_ordering, Adjustment};
pub use query::SearchQuery;
pub use reconcile::{reconcile, reconcile_file, AuditEntry, ReconcileOptions, ReconcileReport};
pub use retry::{fetch_count, RetryPolicy, Sleeper, ThreadSleeper};
pub use source::{CountSource, SourceError};

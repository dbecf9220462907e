//! PR Watch series storage.
//!
//! This crate provides:
//! - The in-memory row table (`TimePoint`, `MetricSeries`)
//! - The header-first CSV codec with unknown-aware cells
//! - Snapshot persistence: load, sibling backup, atomic replace

pub mod csvio;
pub mod point;
pub mod snapshot;

pub use point::{MetricSeries, TimePoint};
pub use snapshot::Snapshot;

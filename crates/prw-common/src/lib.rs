//! PR Watch common types and errors.
//!
//! This crate provides foundational types shared across prw crates:
//! - The tracked-agent roster and counter column naming
//! - Timestamp parsing/formatting for the persisted table and the
//!   count-source query bound
//! - Common error types

pub mod error;
pub mod schema;
pub mod timestamp;

pub use error::{Error, Result};
pub use schema::{Agent, AgentMatcher, MetricKind, TIMESTAMP_COLUMN};

//! In-memory row table for the PR count time series.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prw_common::error::{Error, Result};

/// One row of the series: a timestamp plus the counter values known for
/// it. A column absent from `metrics` is unknown (needs backfill), never
/// zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    /// UTC instant the counts were observed (seconds resolution).
    pub timestamp: DateTime<Utc>,

    /// Known counter values keyed by column name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, u64>,
}

impl TimePoint {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        TimePoint {
            timestamp,
            metrics: BTreeMap::new(),
        }
    }

    /// Known value for a column, or `None` when the column is unknown at
    /// this row.
    pub fn get(&self, column: &str) -> Option<u64> {
        self.metrics.get(column).copied()
    }

    pub fn set(&mut self, column: &str, value: u64) {
        self.metrics.insert(column.to_string(), value);
    }

    /// Seconds since the Unix epoch, as the real-valued instant used for
    /// interpolation.
    pub fn seconds(&self) -> f64 {
        self.timestamp.timestamp() as f64
    }
}

/// An ordered sequence of rows sharing a declared column set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSeries {
    /// Declared counter columns in header order (timestamp excluded).
    pub columns: Vec<String>,

    /// Rows in increasing timestamp order.
    pub rows: Vec<TimePoint>,
}

impl MetricSeries {
    pub fn new(columns: Vec<String>) -> Self {
        MetricSeries {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Declare an additional counter column (appended to the header).
    /// Declaring an existing column is a no-op.
    pub fn declare_column(&mut self, name: &str) {
        if !self.columns.iter().any(|c| c == name) {
            self.columns.push(name.to_string());
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Verify that timestamps never decrease (duplicates are allowed; the
    /// collector appends at most once per run but retries can coincide).
    pub fn ensure_ordered(&self) -> Result<()> {
        for (index, pair) in self.rows.windows(2).enumerate() {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(Error::UnorderedRows { index: index + 1 });
            }
        }
        Ok(())
    }

    /// Verify that every row carries every declared column. Backfill must
    /// leave the table in this state; a gap afterwards is an error, not
    /// an empty value.
    pub fn ensure_complete(&self) -> Result<()> {
        for (index, row) in self.rows.iter().enumerate() {
            for column in &self.columns {
                if !row.metrics.contains_key(column) {
                    return Err(Error::IncompleteRow {
                        index,
                        column: column.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

//! In-place reconciliation of one existing counter column.
//!
//! Collection bugs occasionally leave a column out of step with the
//! upstream source. Reconciliation re-queries the authoritative count
//! for every row where the metric is applicable (the agent's total
//! counter is positive), overwrites the column, and records every
//! changed value for human review. A fetch that fails after retries
//! leaves the stored value alone and is reported, never fatal.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use prw_common::error::{Error, Result};
use prw_common::schema::{Agent, MetricKind};
use prw_common::timestamp;
use prw_series::{snapshot, MetricSeries, TimePoint};

use crate::config::SourceConfig;
use crate::query::SearchQuery;
use crate::retry::{fetch_count, RetryPolicy, Sleeper};
use crate::source::{CountSource, SourceError};

/// One overwritten value, kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub old: u64,
    pub new: u64,
    /// `new - old`, signed.
    pub delta: i64,
}

/// A row whose re-query failed; the stored value was kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub error: String,
}

/// Summary of one reconciliation pass, intended for human review.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    /// Column that was reconciled.
    pub column: String,

    /// Rows that matched the predicate.
    pub examined: usize,

    /// Rows whose value actually changed, in row order.
    pub changes: Vec<AuditEntry>,

    /// Rows left unchanged because the re-query failed.
    pub failures: Vec<FetchFailure>,
}

impl ReconcileReport {
    /// Pretty JSON rendering of the report.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "reconciled {}: {} rows examined, {} changed, {} fetch failures",
            self.column,
            self.examined,
            self.changes.len(),
            self.failures.len()
        )?;
        for entry in &self.changes {
            writeln!(
                f,
                "  row {} @ {}: {} -> {} ({:+})",
                entry.index,
                timestamp::format_table(entry.timestamp),
                entry.old,
                entry.new,
                entry.delta
            )?;
        }
        for failure in &self.failures {
            writeln!(
                f,
                "  row {} @ {}: kept old value ({})",
                failure.index,
                timestamp::format_table(failure.timestamp),
                failure.error
            )?;
        }
        Ok(())
    }
}

/// Overwrite `column` with authoritative counts for every row matching
/// `predicate`.
///
/// `fetch` resolves a row timestamp to a count and is expected to have
/// retries already applied (see `reconcile_file`). Rows not matching the
/// predicate are untouched. The column must be declared and populated at
/// every matching row; reconciliation repairs values, it does not
/// backfill gaps.
pub fn reconcile<P, F>(
    series: &mut MetricSeries,
    column: &str,
    mut predicate: P,
    mut fetch: F,
) -> Result<ReconcileReport>
where
    P: FnMut(&TimePoint) -> bool,
    F: FnMut(DateTime<Utc>) -> std::result::Result<u64, SourceError>,
{
    if !series.has_column(column) {
        return Err(Error::UnknownColumn(column.to_string()));
    }

    let mut report = ReconcileReport {
        column: column.to_string(),
        examined: 0,
        changes: Vec::new(),
        failures: Vec::new(),
    };

    for (index, row) in series.rows.iter_mut().enumerate() {
        if !predicate(row) {
            continue;
        }
        report.examined += 1;

        let old = row.get(column).ok_or_else(|| Error::IncompleteRow {
            index,
            column: column.to_string(),
        })?;

        match fetch(row.timestamp) {
            Ok(new) => {
                if new != old {
                    debug!(
                        index,
                        timestamp = %timestamp::format_table(row.timestamp),
                        old,
                        new,
                        "count corrected"
                    );
                    row.set(column, new);
                    report.changes.push(AuditEntry {
                        index,
                        timestamp: row.timestamp,
                        old,
                        new,
                        delta: new as i64 - old as i64,
                    });
                }
            }
            Err(err) => {
                warn!(
                    index,
                    timestamp = %timestamp::format_table(row.timestamp),
                    error = %err,
                    "re-query failed, keeping stored value"
                );
                report.failures.push(FetchFailure {
                    index,
                    timestamp: row.timestamp,
                    error: err.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Options for a reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    pub retry: RetryPolicy,
    pub config: SourceConfig,
}

/// Reconcile one agent counter against a table on disk: load, back up,
/// re-query rows where the agent's total is positive, atomically
/// persist, and return the audit report.
pub fn reconcile_file<S, Z>(
    path: &Path,
    roster: &[Agent],
    agent: &Agent,
    kind: MetricKind,
    options: &ReconcileOptions,
    source: &mut S,
    sleeper: &mut Z,
) -> Result<ReconcileReport>
where
    S: CountSource,
    Z: Sleeper,
{
    let mut snapshot = snapshot::load(path, roster)?;
    snapshot.backup()?;

    let gate = agent.column(MetricKind::Total);
    let column = agent.column(kind);
    let template = SearchQuery::for_agent(agent, kind);

    let report = reconcile(
        &mut snapshot.series,
        &column,
        |row| row.get(&gate).is_some_and(|total| total > 0),
        |ts| {
            let query = template.clone().created_before(ts);
            let result = fetch_count(source, &query, &options.retry, sleeper);
            sleeper.sleep(options.config.reconcile_delay);
            result
        },
    )?;

    snapshot.persist()?;
    info!(
        column = %report.column,
        examined = report.examined,
        changed = report.changes.len(),
        failures = report.failures.len(),
        "reconciliation complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use prw_series::TimePoint;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn table() -> MetricSeries {
        let mut series = MetricSeries::new(vec![
            "codegen_total".to_string(),
            "codegen_merged".to_string(),
        ]);
        for (i, (total, merged)) in [(0u64, 0u64), (0, 0), (5, 2), (8, 3), (12, 9)]
            .iter()
            .enumerate()
        {
            let mut row = TimePoint::new(ts(i as i64 * 3600));
            row.set("codegen_total", *total);
            row.set("codegen_merged", *merged);
            series.rows.push(row);
        }
        series
    }

    #[test]
    fn only_predicate_rows_are_touched() {
        let mut series = table();
        let report = reconcile(
            &mut series,
            "codegen_merged",
            |row| row.get("codegen_total").is_some_and(|t| t > 0),
            |_ts| Ok(4),
        )
        .unwrap();

        assert_eq!(report.examined, 3);
        // Rows 0 and 1 fail the predicate and keep their values bit for bit.
        assert_eq!(series.rows[0].get("codegen_merged"), Some(0));
        assert_eq!(series.rows[1].get("codegen_merged"), Some(0));
        // Matching rows are overwritten.
        assert_eq!(series.rows[2].get("codegen_merged"), Some(4));
        assert_eq!(series.rows[3].get("codegen_merged"), Some(4));
        assert_eq!(series.rows[4].get("codegen_merged"), Some(4));
    }

    #[test]
    fn diff_contains_exactly_the_changed_rows() {
        let mut series = table();
        let report = reconcile(
            &mut series,
            "codegen_merged",
            |row| row.get("codegen_total").is_some_and(|t| t > 0),
            // Row at t=2h has merged=2 -> returns 2 (no change); others change.
            |ts| Ok(if ts == self::ts(2 * 3600) { 2 } else { 7 }),
        )
        .unwrap();

        assert_eq!(report.changes.len(), 2);
        assert_eq!(
            report.changes[0],
            AuditEntry {
                index: 3,
                timestamp: ts(3 * 3600),
                old: 3,
                new: 7,
                delta: 4,
            }
        );
        assert_eq!(report.changes[1].index, 4);
        assert_eq!(report.changes[1].delta, -2);
    }

    #[test]
    fn failed_fetch_keeps_value_and_is_reported() {
        let mut series = table();
        let report = reconcile(
            &mut series,
            "codegen_merged",
            |row| row.get("codegen_total").is_some_and(|t| t > 0),
            |ts| {
                if ts == self::ts(3 * 3600) {
                    Err(SourceError::Unavailable("boom".to_string()))
                } else {
                    Ok(9)
                }
            },
        )
        .unwrap();

        assert_eq!(series.rows[3].get("codegen_merged"), Some(3));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 3);
        assert_eq!(report.changes.len(), 2);
    }

    #[test]
    fn unknown_column_is_rejected() {
        let mut series = table();
        let err = reconcile(&mut series, "codegen_nondraft", |_| true, |_| Ok(0)).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn(_)));
    }

    #[test]
    fn unpopulated_matching_row_is_an_error() {
        let mut series = table();
        series.rows[2].metrics.remove("codegen_merged");
        let err = reconcile(
            &mut series,
            "codegen_merged",
            |row| row.get("codegen_total").is_some_and(|t| t > 0),
            |_| Ok(0),
        )
        .unwrap_err();
        assert!(matches!(err, Error::IncompleteRow { index: 2, .. }));
    }

    #[test]
    fn report_renders_for_humans() {
        let report = ReconcileReport {
            column: "codegen_merged".to_string(),
            examined: 3,
            changes: vec![AuditEntry {
                index: 122,
                timestamp: ts(0),
                old: 10,
                new: 12,
                delta: 2,
            }],
            failures: vec![],
        };
        let text = report.to_string();
        assert!(text.contains("3 rows examined, 1 changed"));
        assert!(text.contains("row 122 @ 1970-01-01 00:00:00: 10 -> 12 (+2)"));

        let json = report.to_json().unwrap();
        assert!(json.contains("\"delta\": 2"));
    }
}

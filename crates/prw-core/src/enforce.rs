//! Cross-column ordering enforcement.
//!
//! Each agent's counters must satisfy `merged <= nondraft <= total` in
//! every row. The three counts come from separate queries that can
//! observe different moments, so the stored triple occasionally violates
//! the band; this pass repairs it after backfill or reconciliation by
//! clamping the nondraft counter. Rows missing any of the three columns
//! are skipped — unknown is not zero.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use prw_common::error::Result;
use prw_common::schema::{Agent, MetricKind};
use prw_math::clamp_triple;
use prw_series::{snapshot, MetricSeries};

/// One clamped value, kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Adjustment {
    pub index: usize,
    pub agent: String,
    pub old: u64,
    pub new: u64,
}

/// Clamp every agent's nondraft counter into `[merged, total]` across
/// the whole series. Returns the adjustments made; applying the pass a
/// second time yields none.
pub fn enforce_ordering(series: &mut MetricSeries, roster: &[Agent]) -> Vec<Adjustment> {
    let mut adjustments = Vec::new();

    for agent in roster {
        let total_col = agent.column(MetricKind::Total);
        let merged_col = agent.column(MetricKind::Merged);
        let nondraft_col = agent.column(MetricKind::Nondraft);

        for (index, row) in series.rows.iter_mut().enumerate() {
            let (Some(total), Some(merged), Some(nondraft)) = (
                row.get(&total_col),
                row.get(&merged_col),
                row.get(&nondraft_col),
            ) else {
                continue;
            };

            let repaired = clamp_triple(total, merged, nondraft);
            if repaired != nondraft {
                debug!(
                    index,
                    agent = %agent.name,
                    old = nondraft,
                    new = repaired,
                    "nondraft clamped into [merged, total]"
                );
                row.set(&nondraft_col, repaired);
                adjustments.push(Adjustment {
                    index,
                    agent: agent.name.clone(),
                    old: nondraft,
                    new: repaired,
                });
            }
        }
    }

    adjustments
}

/// Run the enforcement pass against a table on disk: load, back up,
/// clamp, atomically persist. Returns the adjustments made.
pub fn enforce_file(path: &Path, roster: &[Agent]) -> Result<Vec<Adjustment>> {
    let mut snapshot = snapshot::load(path, roster)?;
    snapshot.backup()?;

    let adjustments = enforce_ordering(&mut snapshot.series, roster);
    snapshot.persist()?;

    info!(
        path = %path.display(),
        adjustments = adjustments.len(),
        "ordering enforcement complete"
    );
    Ok(adjustments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use prw_series::TimePoint;

    fn roster() -> Vec<Agent> {
        vec![
            Agent::head("copilot", "copilot/"),
            Agent::head("codex", "codex/"),
        ]
    }

    fn row_with(entries: &[(&str, u64)]) -> TimePoint {
        let mut row = TimePoint::new(Utc.timestamp_opt(0, 0).unwrap());
        for (column, value) in entries {
            row.set(column, *value);
        }
        row
    }

    #[test]
    fn clamps_each_agent_independently() {
        let mut series = MetricSeries::new(vec![]);
        series.rows.push(row_with(&[
            ("copilot_total", 100),
            ("copilot_merged", 80),
            ("copilot_nondraft", 50),
            ("codex_total", 100),
            ("codex_merged", 20),
            ("codex_nondraft", 150),
        ]));

        let adjustments = enforce_ordering(&mut series, &roster());

        assert_eq!(series.rows[0].get("copilot_nondraft"), Some(80));
        assert_eq!(series.rows[0].get("codex_nondraft"), Some(100));
        assert_eq!(adjustments.len(), 2);
        assert_eq!(
            adjustments[0],
            Adjustment {
                index: 0,
                agent: "copilot".to_string(),
                old: 50,
                new: 80,
            }
        );
    }

    #[test]
    fn valid_rows_yield_no_adjustments() {
        let mut series = MetricSeries::new(vec![]);
        series.rows.push(row_with(&[
            ("copilot_total", 100),
            ("copilot_merged", 20),
            ("copilot_nondraft", 60),
        ]));

        assert!(enforce_ordering(&mut series, &roster()).is_empty());
        assert_eq!(series.rows[0].get("copilot_nondraft"), Some(60));
    }

    #[test]
    fn second_pass_is_a_noop() {
        let mut series = MetricSeries::new(vec![]);
        series.rows.push(row_with(&[
            ("copilot_total", 10),
            ("copilot_merged", 8),
            ("copilot_nondraft", 2),
        ]));

        let first = enforce_ordering(&mut series, &roster());
        assert_eq!(first.len(), 1);
        let second = enforce_ordering(&mut series, &roster());
        assert!(second.is_empty());
    }

    #[test]
    fn rows_missing_a_column_are_skipped() {
        let mut series = MetricSeries::new(vec![]);
        // No nondraft column yet (pre-backfill row): nothing to clamp.
        series
            .rows
            .push(row_with(&[("copilot_total", 10), ("copilot_merged", 8)]));

        assert!(enforce_ordering(&mut series, &roster()).is_empty());
        assert_eq!(series.rows[0].get("copilot_nondraft"), None);
    }
}

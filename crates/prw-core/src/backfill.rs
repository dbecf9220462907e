//! Historical backfill of newly introduced counter columns.
//!
//! Re-querying every row would blow the upstream rate budget, so the
//! procedure samples sparse rows live (first, last, every Nth), then
//! derives every other row by linear interpolation between its nearest
//! enclosing samples. The fill step is pure; querying and file I/O stay
//! at the edges.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use prw_common::error::{Error, Result};
use prw_common::schema::{Agent, MetricKind};
use prw_common::timestamp;
use prw_math::{interpolate_linear, select_samples, DEFAULT_STRIDE};
use prw_series::{snapshot, MetricSeries};

use crate::config::SourceConfig;
use crate::query::SearchQuery;
use crate::retry::{fetch_count, RetryPolicy, Sleeper};
use crate::source::CountSource;

/// Options for one backfill run.
#[derive(Debug, Clone)]
pub struct BackfillOptions {
    /// Sampling stride between live-queried rows.
    pub stride: usize,

    /// Counter kinds to backfill for every roster agent.
    pub kinds: Vec<MetricKind>,

    pub retry: RetryPolicy,
    pub config: SourceConfig,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        BackfillOptions {
            stride: DEFAULT_STRIDE,
            kinds: vec![MetricKind::Nondraft],
            retry: RetryPolicy::default(),
            config: SourceConfig::default(),
        }
    }
}

/// Authoritative values collected at the sampled rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSet {
    /// Columns every sampled row carries a value for.
    pub columns: Vec<String>,

    /// Per sampled row index, the queried value per column.
    pub values: BTreeMap<usize, BTreeMap<String, u64>>,
}

impl SampleSet {
    /// Sampled row indices in increasing order.
    pub fn indices(&self) -> Vec<usize> {
        self.values.keys().copied().collect()
    }
}

/// Result summary of a completed backfill.
#[derive(Debug, Clone, Serialize)]
pub struct BackfillOutcome {
    pub sampled: Vec<usize>,
    pub columns: Vec<String>,
    pub rows: usize,
}

/// Choose the sampled row indices for an `n`-row series.
pub fn plan_samples(n: usize, stride: usize) -> Result<Vec<usize>> {
    let stride = NonZeroUsize::new(stride).ok_or(Error::ZeroStride)?;
    Ok(select_samples(n, stride))
}

/// Query the source for every planned row and column.
///
/// A query that still fails after retries defaults to 0, matching how
/// the table was historically built; the failure is logged and the run
/// continues. Politeness delays go through `sleeper`.
pub fn collect_samples<S, Z>(
    series: &MetricSeries,
    roster: &[Agent],
    options: &BackfillOptions,
    source: &mut S,
    sleeper: &mut Z,
) -> Result<SampleSet>
where
    S: CountSource,
    Z: Sleeper,
{
    let indices = plan_samples(series.len(), options.stride)?;

    let mut columns = Vec::with_capacity(roster.len() * options.kinds.len());
    for agent in roster {
        for &kind in &options.kinds {
            columns.push(agent.column(kind));
        }
    }

    let mut set = SampleSet {
        columns,
        values: BTreeMap::new(),
    };

    for (pos, &index) in indices.iter().enumerate() {
        let row = &series.rows[index];
        debug!(
            index,
            timestamp = %timestamp::format_table(row.timestamp),
            sample = pos + 1,
            of = indices.len(),
            "sampling row"
        );

        for agent in roster {
            for &kind in &options.kinds {
                let column = agent.column(kind);
                let query = SearchQuery::for_agent(agent, kind).created_before(row.timestamp);
                let value = match fetch_count(source, &query, &options.retry, sleeper) {
                    Ok(count) => count,
                    Err(err) => {
                        warn!(
                            column = %column,
                            timestamp = %timestamp::format_table(row.timestamp),
                            error = %err,
                            "sample query failed, defaulting to 0"
                        );
                        0
                    }
                };
                set.values.entry(index).or_default().insert(column, value);
                sleeper.sleep(options.config.query_delay);
            }
        }

        if pos + 1 < indices.len() {
            sleeper.sleep(options.config.sample_delay);
        }
    }

    Ok(set)
}

/// Populate every row of `series` for every sampled column.
///
/// Sampled rows take the authoritative value verbatim; other rows
/// interpolate between the nearest enclosing samples on the
/// seconds-resolution time axis. The sampler contract guarantees the
/// first and last row are sampled, so a row outside the sampled span is
/// a broken contract, reported as a fatal error rather than patched
/// over.
pub fn fill(series: &mut MetricSeries, samples: &SampleSet) -> Result<()> {
    if series.is_empty() {
        return Ok(());
    }

    let indices = samples.indices();
    let (first, last) = match (indices.first(), indices.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(Error::EmptySampleSet),
    };
    if last >= series.len() {
        return Err(Error::SampleBounds {
            index: last,
            first: 0,
            last: series.len() - 1,
        });
    }

    for column in &samples.columns {
        series.declare_column(column);
    }

    for i in 0..series.len() {
        if let Some(values) = samples.values.get(&i) {
            for column in &samples.columns {
                let value = values.get(column).copied().ok_or_else(|| Error::SampleGap {
                    index: i,
                    column: column.clone(),
                })?;
                series.rows[i].set(column, value);
            }
            continue;
        }

        if i < first || i > last {
            return Err(Error::SampleBounds { index: i, first, last });
        }
        let pos = indices.partition_point(|&s| s < i);
        let (prev, next) = match (pos.checked_sub(1).and_then(|p| indices.get(p)), indices.get(pos))
        {
            (Some(&prev), Some(&next)) => (prev, next),
            _ => return Err(Error::SampleBounds { index: i, first, last }),
        };

        let t_prev = series.rows[prev].seconds();
        let t_next = series.rows[next].seconds();
        let t_row = series.rows[i].seconds();
        let prev_values = &samples.values[&prev];
        let next_values = &samples.values[&next];

        for column in &samples.columns {
            let start = prev_values.get(column).copied().ok_or_else(|| Error::SampleGap {
                index: prev,
                column: column.clone(),
            })?;
            let end = next_values.get(column).copied().ok_or_else(|| Error::SampleGap {
                index: next,
                column: column.clone(),
            })?;
            let value = interpolate_linear(start, end, t_prev, t_next, t_row);
            series.rows[i].set(column, value);
        }
    }

    Ok(())
}

/// The whole procedure against a table on disk: load, back up, sample,
/// fill, verify completeness, atomically persist.
pub fn backfill_file<S, Z>(
    path: &Path,
    roster: &[Agent],
    options: &BackfillOptions,
    source: &mut S,
    sleeper: &mut Z,
) -> Result<BackfillOutcome>
where
    S: CountSource,
    Z: Sleeper,
{
    let mut snapshot = snapshot::load(path, roster)?;
    if snapshot.series.is_empty() {
        info!(path = %path.display(), "table has no rows, nothing to backfill");
        return Ok(BackfillOutcome {
            sampled: Vec::new(),
            columns: Vec::new(),
            rows: 0,
        });
    }

    snapshot.backup()?;
    let samples = collect_samples(&snapshot.series, roster, options, source, sleeper)?;
    fill(&mut snapshot.series, &samples)?;
    snapshot.series.ensure_complete()?;
    snapshot.persist()?;

    let outcome = BackfillOutcome {
        sampled: samples.indices(),
        columns: samples.columns.clone(),
        rows: snapshot.series.len(),
    };
    info!(
        samples = outcome.sampled.len(),
        columns = outcome.columns.len(),
        rows = outcome.rows,
        "backfill complete"
    );
    Ok(outcome)
}

//! Header-first CSV codec for the persisted table.
//!
//! The format is deliberately narrow: a `timestamp` column followed by
//! integer counter columns, no quoting or escaping (cells are timestamps
//! and integers, so a quote or embedded comma is corrupt data, not a
//! feature). Rows may carry fewer cells than the header — older rows
//! predate newer columns — and a missing or empty cell is an unknown
//! value, not zero.

use prw_common::error::{Error, Result};
use prw_common::schema::{self, Agent};
use prw_common::timestamp;

use crate::point::{MetricSeries, TimePoint};

/// Parse a whole table. The header is validated against the roster; the
/// declared column set is taken from the header (timestamp excluded).
pub fn parse(text: &str, roster: &[Agent]) -> Result<MetricSeries> {
    let mut lines = text.lines();

    let header_line = lines
        .next()
        .ok_or_else(|| Error::Header("table has no header line".to_string()))?;
    let header: Vec<String> = split_cells(header_line, 1)?
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();
    schema::validate_header(&header, roster)?;

    let mut series = MetricSeries::new(header[1..].to_vec());

    for (offset, line) in lines.enumerate() {
        let line_no = offset + 2;
        if line.trim().is_empty() {
            continue;
        }

        let cells = split_cells(line, line_no)?;
        if cells.len() > header.len() {
            return Err(Error::Row {
                line: line_no,
                reason: format!(
                    "row has {} cells but the header declares {}",
                    cells.len(),
                    header.len()
                ),
            });
        }

        let mut row = TimePoint::new(timestamp::parse_table(cells[0])?);
        for (cell, column) in cells[1..].iter().zip(&header[1..]) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            let value: u64 = cell.parse().map_err(|_| Error::Row {
                line: line_no,
                reason: format!("column {column} has non-integer cell {cell:?}"),
            })?;
            row.set(column, value);
        }
        series.rows.push(row);
    }

    series.ensure_ordered()?;
    Ok(series)
}

/// Serialize a table back to CSV text. Unknown cells render empty; a
/// trailing newline matches what the collector appends against.
pub fn serialize(series: &MetricSeries) -> String {
    let mut out = String::new();

    out.push_str(prw_common::TIMESTAMP_COLUMN);
    for column in &series.columns {
        out.push(',');
        out.push_str(column);
    }
    out.push('\n');

    for row in &series.rows {
        out.push_str(&timestamp::format_table(row.timestamp));
        for column in &series.columns {
            out.push(',');
            if let Some(value) = row.get(column) {
                out.push_str(&value.to_string());
            }
        }
        out.push('\n');
    }

    out
}

fn split_cells(line: &str, line_no: usize) -> Result<Vec<&str>> {
    if line.contains('"') {
        return Err(Error::Row {
            line: line_no,
            reason: "quoted cells are not part of the table format".to_string(),
        });
    }
    Ok(line.split(',').collect())
}

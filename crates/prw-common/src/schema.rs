//! Tracked-agent roster and table column layout.
//!
//! The persisted table has a `timestamp` column followed by integer
//! counter columns named `{agent}_{kind}`. The layout grew over time:
//! total/merged pairs came first, the nondraft columns were appended
//! later as a block, and the canonical header preserves that order so
//! the expanded table stays readable against old copies.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the leading timestamp column.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Counter kinds tracked per agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// All PRs attributed to the agent.
    Total,
    /// PRs that reached merged state.
    Merged,
    /// PRs not marked as draft.
    Nondraft,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Total => "total",
            MetricKind::Merged => "merged",
            MetricKind::Nondraft => "nondraft",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an agent's PRs are identified in the upstream search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMatcher {
    /// PRs whose head branch starts with the given prefix (e.g. `copilot/`).
    HeadPrefix(String),
    /// PRs opened by the given author login (e.g. `devin-ai-integration[bot]`).
    Author(String),
}

/// A named source of automated PRs being tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Short name used as the column prefix (e.g. `copilot`).
    pub name: String,
    /// How this agent's PRs are matched upstream.
    pub matcher: AgentMatcher,
}

impl Agent {
    /// Agent matched by head-branch prefix.
    pub fn head(name: &str, prefix: &str) -> Self {
        Agent {
            name: name.to_string(),
            matcher: AgentMatcher::HeadPrefix(prefix.to_string()),
        }
    }

    /// Agent matched by author login.
    pub fn author(name: &str, login: &str) -> Self {
        Agent {
            name: name.to_string(),
            matcher: AgentMatcher::Author(login.to_string()),
        }
    }

    /// Column name for one of this agent's counters.
    pub fn column(&self, kind: MetricKind) -> String {
        format!("{}_{}", self.name, kind)
    }
}

/// The default roster of tracked agents.
pub fn default_roster() -> Vec<Agent> {
    vec![
        Agent::head("copilot", "copilot/"),
        Agent::head("codex", "codex/"),
        Agent::head("cursor", "cursor/"),
        Agent::author("devin", "devin-ai-integration[bot]"),
        Agent::author("codegen", "codegen-sh[bot]"),
    ]
}

/// Canonical header for a fully-populated table: timestamp, then
/// total/merged pairs per agent, then nondraft columns per agent.
pub fn expected_header(roster: &[Agent]) -> Vec<String> {
    let mut header = Vec::with_capacity(1 + roster.len() * 3);
    header.push(TIMESTAMP_COLUMN.to_string());
    for agent in roster {
        header.push(agent.column(MetricKind::Total));
        header.push(agent.column(MetricKind::Merged));
    }
    for agent in roster {
        header.push(agent.column(MetricKind::Nondraft));
    }
    header
}

/// Validate a parsed header against the roster.
///
/// The timestamp column must come first and every remaining column must
/// belong to a roster agent. Columns may be absent (older tables predate
/// the nondraft block) but unknown or misplaced columns are rejected.
pub fn validate_header(header: &[String], roster: &[Agent]) -> Result<()> {
    match header.first() {
        Some(first) if first == TIMESTAMP_COLUMN => {}
        Some(first) => {
            return Err(Error::Header(format!(
                "expected leading {TIMESTAMP_COLUMN} column, found {first:?}"
            )))
        }
        None => return Err(Error::Header("header is empty".to_string())),
    }

    let known = expected_header(roster);
    let mut cursor = 0usize;
    for column in &header[1..] {
        // Every column must appear in the canonical layout, at or after
        // the position of the previously accepted column.
        match known[cursor..].iter().position(|k| k == column) {
            Some(offset) => cursor += offset + 1,
            None => {
                if known.contains(column) {
                    return Err(Error::Header(format!(
                        "column {column} is out of order"
                    )));
                }
                return Err(Error::UnknownColumn(column.clone()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_naming() {
        let copilot = Agent::head("copilot", "copilot/");
        assert_eq!(copilot.column(MetricKind::Total), "copilot_total");
        assert_eq!(copilot.column(MetricKind::Nondraft), "copilot_nondraft");
    }

    #[test]
    fn expected_header_matches_historical_layout() {
        let header = expected_header(&default_roster());
        assert_eq!(
            header,
            vec![
                "timestamp",
                "copilot_total",
                "copilot_merged",
                "codex_total",
                "codex_merged",
                "cursor_total",
                "cursor_merged",
                "devin_total",
                "devin_merged",
                "codegen_total",
                "codegen_merged",
                "copilot_nondraft",
                "codex_nondraft",
                "cursor_nondraft",
                "devin_nondraft",
                "codegen_nondraft",
            ]
        );
    }

    #[test]
    fn validate_accepts_full_and_partial_headers() {
        let roster = default_roster();
        validate_header(&expected_header(&roster), &roster).unwrap();

        // Pre-nondraft header (older table) is still valid.
        let partial: Vec<String> = expected_header(&roster)
            .into_iter()
            .filter(|c| !c.ends_with("_nondraft"))
            .collect();
        validate_header(&partial, &roster).unwrap();
    }

    #[test]
    fn validate_rejects_unknown_and_misordered() {
        let roster = default_roster();

        let mut unknown = expected_header(&roster);
        unknown.push("mystery_total".to_string());
        let err = validate_header(&unknown, &roster).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn(_)));

        let mut swapped = expected_header(&roster);
        swapped.swap(1, 2);
        let err = validate_header(&swapped, &roster).unwrap_err();
        assert!(matches!(err, Error::Header(_)));

        let err = validate_header(&["copilot_total".to_string()], &roster).unwrap_err();
        assert!(matches!(err, Error::Header(_)));
    }
}

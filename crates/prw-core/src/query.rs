//! Filter-expression model for the count source.
//!
//! A query is a boolean predicate over PR attributes: how the agent is
//! matched (head-branch prefix or author login), merged state, draft
//! exclusion, and an optional creation-time upper bound used for
//! historical point-in-time counts. The rendered form uses the search
//! index's `+`-joined qualifier syntax.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prw_common::schema::{Agent, AgentMatcher, MetricKind};
use prw_common::timestamp;

/// One count query against the upstream search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// How the agent's PRs are identified.
    pub matcher: AgentMatcher,

    /// Restrict to merged PRs (`is:merged`).
    pub merged_only: bool,

    /// Exclude drafts (`-is:draft`).
    pub exclude_drafts: bool,

    /// Count only PRs created strictly before this instant.
    pub created_before: Option<DateTime<Utc>>,
}

impl SearchQuery {
    /// The query that produces `agent.column(kind)`.
    pub fn for_agent(agent: &Agent, kind: MetricKind) -> Self {
        SearchQuery {
            matcher: agent.matcher.clone(),
            merged_only: kind == MetricKind::Merged,
            exclude_drafts: kind == MetricKind::Nondraft,
            created_before: None,
        }
    }

    /// Bound the query to PRs created before `ts`.
    pub fn created_before(mut self, ts: DateTime<Utc>) -> Self {
        self.created_before = Some(ts);
        self
    }

    /// Render the `+`-joined qualifier string the source consumes.
    pub fn to_query_string(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(4);
        match &self.matcher {
            AgentMatcher::HeadPrefix(prefix) => {
                parts.push("is:pr".to_string());
                parts.push(format!("head:{prefix}"));
            }
            AgentMatcher::Author(login) => {
                parts.push(format!("author:{login}"));
            }
        }
        if self.merged_only {
            parts.push("is:merged".to_string());
        }
        if self.exclude_drafts {
            parts.push("-is:draft".to_string());
        }
        if let Some(ts) = self.created_before {
            parts.push(format!("created:<{}", timestamp::format_query(ts)));
        }
        parts.join("+")
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

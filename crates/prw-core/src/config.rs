//! Per-run source configuration.
//!
//! One value constructed at the start of a run and passed to whatever
//! implements the count source; nothing here is global state. The token
//! is optional — the public search index answers unauthenticated
//! requests, just with a tighter rate budget.

use std::time::Duration;

/// Settings handed to a count-source implementation for one run.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// User-agent string a network-backed source should present.
    pub user_agent: String,

    /// Optional API token for a higher rate budget.
    pub token: Option<String>,

    /// Politeness delay after every individual count query.
    pub query_delay: Duration,

    /// Additional delay between sampled rows during backfill.
    pub sample_delay: Duration,

    /// Delay between rows during reconciliation.
    pub reconcile_delay: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            user_agent: "PR-Watcher".to_string(),
            token: None,
            query_delay: Duration::from_secs(3),
            sample_delay: Duration::from_secs(10),
            reconcile_delay: Duration::from_secs(1),
        }
    }
}

impl SourceConfig {
    /// Default configuration with the token taken from the
    /// `GITHUB_TOKEN` environment variable when present.
    pub fn from_env() -> Self {
        SourceConfig {
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            ..SourceConfig::default()
        }
    }

    /// Zero every delay. Used by tests and dry runs.
    pub fn without_delays(mut self) -> Self {
        self.query_delay = Duration::ZERO;
        self.sample_delay = Duration::ZERO;
        self.reconcile_delay = Duration::ZERO;
        self
    }
}

//! Snapshot persistence: load, sibling backup, atomic replace.
//!
//! Backfill and reconciliation are destructive full-file rewrites, so the
//! lifecycle is fixed: load the whole table, copy the on-disk file to a
//! sibling backup, mutate in memory, then write through a temporary file
//! and rename over the original. A crash mid-write leaves either the old
//! table or the new one, never a truncated file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use prw_common::error::{Error, Result};
use prw_common::schema::Agent;

use crate::csvio;
use crate::point::MetricSeries;

/// A loaded table tied to its on-disk location.
#[derive(Debug, Clone)]
pub struct Snapshot {
    path: PathBuf,
    pub series: MetricSeries,
}

/// Load and validate a table from `path`.
pub fn load(path: &Path, roster: &[Agent]) -> Result<Snapshot> {
    let text = fs::read_to_string(path)?;
    let series = csvio::parse(&text, roster)?;
    info!(path = %path.display(), rows = series.len(), "loaded table");
    Ok(Snapshot {
        path: path.to_path_buf(),
        series,
    })
}

impl Snapshot {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy the on-disk file to a sibling `{stem}_backup.{ext}` and
    /// return the backup path. Called before any destructive rewrite so
    /// a bad run can be recovered by restoring the copy.
    pub fn backup(&self) -> Result<PathBuf> {
        let backup = sibling_backup_path(&self.path)?;
        fs::copy(&self.path, &backup)?;
        info!(backup = %backup.display(), "backup created");
        Ok(backup)
    }

    /// Write the in-memory series through a temporary file in the same
    /// directory, then rename it over the original.
    pub fn persist(&self) -> Result<()> {
        let tmp = self.path.with_extension("csv.tmp");
        fs::write(&tmp, csvio::serialize(&self.series))?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), rows = self.series.len(), "table persisted");
        Ok(())
    }
}

fn sibling_backup_path(path: &Path) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Io(std::io::Error::other("table path has no file name")))?;
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_backup.{ext}"),
        None => format!("{stem}_backup"),
    };
    Ok(path.with_file_name(name))
}

//! JSON handoff to the persistence layer.
//!
//! Each run writes one file holding the flat record array:
//!
//! ```text
//! output_dir/
//! └── 2025-05-06/
//!     ├── updates-070012.json
//!     └── updates-190455.json
//! ```
//!
//! Dates and times are UTC. Deduplication against earlier runs is the
//! consumer's job; a file holds exactly what one run produced.

use crate::models::NormalizedUpdateRecord;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Where a run started at `run_at` writes its records.
pub fn output_path(output_dir: &Path, run_at: DateTime<Utc>) -> PathBuf {
    output_dir
        .join(run_at.format("%Y-%m-%d").to_string())
        .join(format!("updates-{}.json", run_at.format("%H%M%S")))
}

/// Write `records` under `output_dir`, creating the date directory as needed.
///
/// # Arguments
///
/// * `records` - Everything the run produced, in registry order
/// * `output_dir` - Root directory; the dated subdirectory goes inside it
/// * `run_at` - Run start time, which names the directory and the file
///
/// # Returns
///
/// The path of the file written, as laid out by [`output_path`].
#[instrument(level = "info", skip(records), fields(output_dir = %output_dir.display(), count = records.len()))]
pub async fn write_records(
    records: &[NormalizedUpdateRecord],
    output_dir: &Path,
    run_at: DateTime<Utc>,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(records)?;
    let path = output_path(output_dir, run_at);

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote update records");
    Ok(path)
}

/// Print `records` as a JSON array on stdout.
pub fn write_stdout(records: &[NormalizedUpdateRecord]) -> Result<(), Box<dyn Error>> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, records)?;
    writeln!(out)?;
    Ok(())
}

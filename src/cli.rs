//! Command-line interface definitions for regwatch.
//!
//! All options can be given as flags; the registry and output directory also
//! fall back to environment variables, which suits cron and container runs.

use crate::config::Registry;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Scrape bank and regulator newsrooms into normalized update records.
///
/// # Examples
///
/// ```sh
/// # Every built-in source, records to stdout
/// regwatch
///
/// # Two banks, written under ./data
/// regwatch --source HSBC --source Barclays --output-dir ./data
///
/// # Replay saved pages instead of launching Chrome
/// regwatch --replay-dir ./saved --delay-ms 0
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Registry file (YAML or JSON). Defaults to the built-in registry
    #[arg(short, long, env = "REGWATCH_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Only scrape this source key; repeat for several
    #[arg(short, long = "source", value_name = "KEY")]
    pub sources: Vec<String>,

    /// Directory for dated JSON output. Without it records go to stdout
    #[arg(short, long, env = "REGWATCH_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Cap on records per source
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Politeness delay between sources, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Sources scraped at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Read pages from `<DIR>/<source_key>.html` instead of a live browser
    #[arg(long, value_name = "DIR")]
    pub replay_dir: Option<PathBuf>,

    /// Print the configured sources and exit
    #[arg(long)]
    pub list_sources: bool,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,
}

impl Cli {
    /// Apply the flags that override registry settings and source selection.
    pub fn apply(&self, registry: &mut Registry) {
        let settings = registry.settings_mut();
        if let Some(max_items) = self.max_items {
            settings.max_items = max_items;
        }
        if let Some(delay_ms) = self.delay_ms {
            settings.delay_ms = delay_ms;
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency.max(1);
        }
        if self.headful {
            settings.headless = false;
        }
        if !self.sources.is_empty() {
            registry.retain_keys(&self.sources);
        }
        if self.replay_dir.is_some() {
            registry.disable_feeds();
        }
        info!(
            sources = registry.sources().len(),
            max_items = registry.settings().max_items,
            delay_ms = registry.settings().delay_ms,
            "Run configuration resolved"
        );
    }
}

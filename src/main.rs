//! # regwatch
//!
//! Scrapes bank and regulator newsrooms into normalized update records.
//!
//! ## Usage
//!
//! ```sh
//! regwatch --output-dir ./data
//! regwatch --source HSBC --source UBS
//! regwatch --replay-dir ./saved --delay-ms 0
//! ```
//!
//! ## Flow
//!
//! 1. **Registry**: load `--registry` (or the built-in one) and apply flags
//! 2. **Scrape**: every selected source in its own browser session or feed fetch
//! 3. **Output**: one dated JSON file under `--output-dir`, or JSON on stdout
//!
//! Logs go to stderr; tune them with `RUST_LOG` (default `info`).

use chrono::Utc;
use clap::Parser;
use regwatch::browser::{BrowserLauncher, ChromeLauncher, FixtureLauncher};
use regwatch::cli::Cli;
use regwatch::config::Registry;
use regwatch::outputs::json;
use regwatch::pipeline::Scraper;
use regwatch::utils::ensure_writable_dir;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let run_at = Utc::now();
    info!("regwatch starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Registry ----
    let mut registry = match &args.registry {
        Some(path) => Registry::load(path)?,
        None => Registry::builtin()?,
    };
    args.apply(&mut registry);

    if args.list_sources {
        for source in registry.sources() {
            let via = if source.feed_url.is_some() { "feed" } else { "browser" };
            println!(
                "{:<18} {:<14} {:<8} {}",
                source.source_key, source.category, via, source.url
            );
        }
        return Ok(());
    }

    // Fail before scraping rather than after
    if let Some(dir) = &args.output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Scrape ----
    let launcher: Arc<dyn BrowserLauncher> = match &args.replay_dir {
        Some(dir) => Arc::new(FixtureLauncher::from_dir(dir, registry.sources())?),
        None => Arc::new(ChromeLauncher),
    };
    let scraper = Scraper::new(registry, launcher)?;
    let records = scraper.scrape_all().await;

    // ---- Output ----
    match &args.output_dir {
        Some(dir) => {
            json::write_records(&records, dir, run_at).await?;
        }
        None => json::write_stdout(&records)?,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        records = records.len(),
        "Execution complete"
    );

    Ok(())
}

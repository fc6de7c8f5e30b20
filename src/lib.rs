//! # regwatch
//!
//! Regulatory-intelligence scraping for bank and regulator newsrooms.
//!
//! A [`Registry`] lists the sources. For each one a [`Scraper`] opens an
//! isolated headless browser, lets the source's [`SourceExtractor`] wait for
//! the page, dismiss banners and scroll, then reads candidate items out of the
//! DOM. Items are filtered (headline length, navigation labels, social links,
//! duplicates), capped per source and normalized into
//! [`NormalizedUpdateRecord`]s for the persistence layer.
//!
//! ```no_run
//! use regwatch::{ChromeLauncher, Registry, Scraper};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let scraper = Scraper::new(Registry::builtin()?, Arc::new(ChromeLauncher::default()))?;
//! let records = scraper.scrape_source("HSBC").await;
//! println!("{} records", records.len());
//! # Ok(())
//! # }
//! ```
//!
//! Failures never escape a source: a site that is down, blocks the browser or
//! changes its markup simply contributes no records to that run.

pub mod browser;
pub mod cli;
pub mod config;
pub mod dates;
pub mod error;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod scrapers;
pub mod utils;

pub use browser::{BrowserLauncher, ChromeLauncher, FixtureLauncher, PageSession, SessionOptions};
pub use config::{Registry, ScrapeSettings, SourceConfig};
pub use error::ScrapeError;
pub use models::{NormalizedUpdateRecord, RawExtractedItem};
pub use pipeline::Scraper;
pub use scrapers::{ExtractorRegistry, SourceExtractor};

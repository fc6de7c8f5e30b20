//! The batch orchestrator.
//!
//! [`Scraper`] walks the registry and, for each source, opens a fresh browser
//! session (or downloads the feed), lets the source's extractor prepare and
//! read the page, caps the result and normalizes it. Sources are isolated from
//! each other: an error or panic in one is logged and that source contributes
//! no records. Neither [`Scraper::scrape_all`] nor [`Scraper::scrape_source`]
//! can fail.
//!
//! By default sources run one at a time with a politeness delay (plus up to
//! 250 ms of jitter) between them. `settings.concurrency` allows several
//! sources in flight, but their starts stay at least one delay apart and
//! records still come back in registry order.

use crate::browser::{BrowserLauncher, Navigation, SessionOptions};
use crate::config::{Registry, SourceConfig};
use crate::error::ScrapeError;
use crate::models::{NormalizedUpdateRecord, RawExtractedItem};
use crate::scrapers::{ExtractorRegistry, SourceExtractor, feed};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use rand::{Rng, rng};
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use scraper::Html;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{Span, debug, error, info, instrument, warn};

pub mod normalize;

pub use normalize::normalize;

const JITTER_MS: u64 = 250;

/// Scrapes the sources of one [`Registry`].
pub struct Scraper {
    registry: Registry,
    extractors: ExtractorRegistry,
    launcher: Arc<dyn BrowserLauncher>,
    http: reqwest::Client,
}

impl Scraper {
    /// A scraper using the built-in bank extractors.
    pub fn new(registry: Registry, launcher: Arc<dyn BrowserLauncher>) -> Result<Self, ScrapeError> {
        Self::with_extractors(registry, ExtractorRegistry::with_builtin(), launcher)
    }

    pub fn with_extractors(
        registry: Registry,
        extractors: ExtractorRegistry,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Result<Self, ScrapeError> {
        let settings = registry.settings();
        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(&settings.accept_language).map_err(|e| {
            ScrapeError::Registry(format!("invalid accept_language {:?}: {e}", settings.accept_language))
        })?;
        headers.insert(ACCEPT_LANGUAGE, language);
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .timeout(settings.navigation_timeout())
            .build()?;

        Ok(Self {
            registry,
            extractors,
            launcher,
            http,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Scrape every source in the registry, in order.
    #[instrument(level = "info", skip(self), fields(sources = self.registry.sources().len()))]
    pub async fn scrape_all(&self) -> Vec<NormalizedUpdateRecord> {
        let settings = self.registry.settings();
        let concurrency = settings.concurrency.max(1);
        let delay = settings.delay();
        info!(concurrency, delay_ms = settings.delay_ms, "Starting batch");

        let per_source: Vec<Vec<NormalizedUpdateRecord>> =
            stream::iter(self.registry.sources().iter().enumerate())
                .then(|(i, source)| async move {
                    // Paces start times: `then` hands out one source per pause
                    if i > 0 {
                        politeness_pause(delay).await;
                    }
                    source
                })
                .map(|source| self.run_source(source))
                .buffered(concurrency)
                .collect()
                .await;

        let empty = per_source.iter().filter(|r| r.is_empty()).count();
        let records: Vec<_> = per_source.into_iter().flatten().collect();
        info!(
            records = records.len(),
            empty_sources = empty,
            "Batch complete"
        );
        records
    }

    /// Scrape a single source by key. Unknown keys yield nothing.
    pub async fn scrape_source(&self, source_key: &str) -> Vec<NormalizedUpdateRecord> {
        match self.registry.get(source_key) {
            Some(source) => self.run_source(source).await,
            None => {
                warn!(source = %source_key, "Unknown source key; nothing to scrape");
                Vec::new()
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(source = %source.source_key))]
    async fn run_source(&self, source: &SourceConfig) -> Vec<NormalizedUpdateRecord> {
        let started = Instant::now();
        let fetched_at = Utc::now();

        let (outcome, source_type) = match &source.feed_url {
            Some(feed_url) => (feed::fetch_feed(&self.http, source, feed_url).await, "feed"),
            None => (self.render_and_extract(source).await, self.launcher.source_type()),
        };
        let raw = match outcome {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "Source failed; it contributes no records this run");
                return Vec::new();
            }
        };

        let cap = source
            .max_items
            .unwrap_or(self.registry.settings().max_items);
        let found = raw.len();
        let records: Vec<_> = raw
            .into_iter()
            .filter_map(|item| normalize(item, source, source_type, fetched_at))
            .unique_by(|record| record.url.clone())
            .take(cap)
            .collect();

        info!(
            found,
            kept = records.len(),
            cap,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Source scraped"
        );
        records
    }

    /// Drive a browser session on a blocking thread and extract from its DOM.
    async fn render_and_extract(&self, source: &SourceConfig) -> Result<Vec<RawExtractedItem>, ScrapeError> {
        let launcher = Arc::clone(&self.launcher);
        let extractor = self.extractors.for_source(&source.source_key);
        let options = SessionOptions::from_settings(self.registry.settings());
        let source = source.clone();
        let span = Span::current();

        debug!(extractor = extractor.name(), "Rendering page");
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            render_blocking(launcher.as_ref(), extractor.as_ref(), &options, &source)
        })
        .await
        .map_err(|e| ScrapeError::Task(e.to_string()))?
    }
}

impl std::fmt::Debug for Scraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scraper")
            .field("sources", &self.registry.sources().len())
            .field("extractors", &self.extractors)
            .field("source_type", &self.launcher.source_type())
            .finish()
    }
}

fn render_blocking(
    launcher: &dyn BrowserLauncher,
    extractor: &dyn SourceExtractor,
    options: &SessionOptions,
    source: &SourceConfig,
) -> Result<Vec<RawExtractedItem>, ScrapeError> {
    let mut page = launcher.open(options)?;
    match page.navigate(&source.url)? {
        Navigation::Loaded => debug!(url = %source.url, "Page loaded"),
        Navigation::TimedOut => warn!(
            url = %source.url,
            timeout = ?options.navigation_timeout,
            "Navigation timed out; extracting from the partial page"
        ),
    }
    if let Some(settle) = source.settle_time() {
        page.pause(settle);
    }
    extractor.prepare(page.as_mut(), source);

    let html = page.content()?;
    let document = Html::parse_document(&html);
    extractor.extract(&document, source)
}

async fn politeness_pause(delay: Duration) {
    let jitter_ms: u64 = rng().random_range(0..=JITTER_MS);
    let pause = delay + Duration::from_millis(jitter_ms);
    debug!(pause_ms = pause.as_millis() as u64, "Politeness delay");
    sleep(pause).await;
}

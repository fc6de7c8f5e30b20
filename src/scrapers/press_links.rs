//! The rule-driven extractor behind most bank newsrooms.
//!
//! Bank press pages differ in markup but share a shape: a list of links whose
//! path contains a section marker such as `/press-releases/`, mixed with
//! navigation, pagination and "read more" links. A [`LinkPatternExtractor`]
//! captures one site's rules:
//!
//! - which path fragments mark an article link
//! - which paths are listing pages (excluded even though they match)
//! - the selector that shows the list has rendered, and how long to wait
//! - a minimum headline length (never below 15)
//! - an optional cookie banner to accept and a number of scroll cycles

use super::SourceExtractor;
use super::dom::{ANCHOR, card_for, date_within, description_within, title_candidates};
use super::filters::{ItemCollector, MIN_TITLE_LEN, acceptable_title, resolve_link};
use crate::browser::{PageSession, SCROLL_TO_BOTTOM};
use crate::config::SourceConfig;
use crate::error::ScrapeError;
use crate::models::RawExtractedItem;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const COOKIE_WAIT: Duration = Duration::from_secs(5);
const AFTER_COOKIE_PAUSE: Duration = Duration::from_millis(1000);

/// Extracts article links matching per-site path rules.
#[derive(Debug, Clone)]
pub struct LinkPatternExtractor {
    name: &'static str,
    link_patterns: Vec<&'static str>,
    listing_paths: Vec<&'static str>,
    ready_selector: &'static str,
    ready_timeout: Duration,
    min_title_len: usize,
    cookie_banner: Option<&'static str>,
    scroll_cycles: u32,
    scroll_pause: Duration,
}

impl LinkPatternExtractor {
    /// Links whose path contains any of `link_patterns` are candidates.
    pub fn new(name: &'static str, link_patterns: &[&'static str]) -> Self {
        Self {
            name,
            link_patterns: link_patterns.to_vec(),
            listing_paths: Vec::new(),
            ready_selector: "a[href]",
            ready_timeout: Duration::from_secs(10),
            min_title_len: MIN_TITLE_LEN,
            cookie_banner: None,
            scroll_cycles: 0,
            scroll_pause: Duration::from_millis(1500),
        }
    }

    /// Wait up to `timeout_secs` for `selector` before snapshotting.
    pub fn ready_when(mut self, selector: &'static str, timeout_secs: u64) -> Self {
        self.ready_selector = selector;
        self.ready_timeout = Duration::from_secs(timeout_secs);
        self
    }

    /// Section roots that match the patterns but are listings, not articles.
    pub fn listing_paths(mut self, paths: &[&'static str]) -> Self {
        self.listing_paths = paths.to_vec();
        self
    }

    pub fn min_title_len(mut self, len: usize) -> Self {
        self.min_title_len = len.max(MIN_TITLE_LEN);
        self
    }

    /// Click this consent button before anything else.
    pub fn accept_cookies(mut self, selector: &'static str) -> Self {
        self.cookie_banner = Some(selector);
        self
    }

    /// Scroll to the bottom `cycles` times, pausing `pause_ms` after each.
    pub fn scroll(mut self, cycles: u32, pause_ms: u64) -> Self {
        self.scroll_cycles = cycles;
        self.scroll_pause = Duration::from_millis(pause_ms);
        self
    }

    fn matches_pattern(&self, url: &Url) -> bool {
        let path = url.path().to_ascii_lowercase();
        self.link_patterns.iter().any(|p| path.contains(p))
    }

    fn is_listing(&self, url: &Url, page: Option<&Url>) -> bool {
        let path = url.path().trim_end_matches('/');
        if self
            .listing_paths
            .iter()
            .any(|listing| path.eq_ignore_ascii_case(listing.trim_end_matches('/')))
        {
            return true;
        }
        page.is_some_and(|page| {
            page.host_str() == url.host_str() && page.path().trim_end_matches('/') == path
        })
    }
}

impl SourceExtractor for LinkPatternExtractor {
    fn name(&self) -> &str {
        self.name
    }

    fn prepare(&self, page: &mut dyn PageSession, source: &SourceConfig) {
        if let Some(banner) = self.cookie_banner {
            if page.wait_for(banner, COOKIE_WAIT) && page.click(banner) {
                info!(source = %source.source_key, "Accepted cookie banner");
                page.pause(AFTER_COOKIE_PAUSE);
            } else {
                debug!(source = %source.source_key, %banner, "No cookie banner to accept");
            }
        }

        if !page.wait_for(self.ready_selector, self.ready_timeout) {
            debug!(
                source = %source.source_key,
                selector = self.ready_selector,
                timeout = ?self.ready_timeout,
                "Content selector never appeared; extracting from current DOM"
            );
        }

        for cycle in 0..self.scroll_cycles {
            if let Err(e) = page.run_script(SCROLL_TO_BOTTOM) {
                debug!(source = %source.source_key, cycle, error = %e, "Scroll script failed");
                break;
            }
            page.pause(self.scroll_pause);
        }
    }

    fn extract(
        &self,
        document: &Html,
        source: &SourceConfig,
    ) -> Result<Vec<RawExtractedItem>, ScrapeError> {
        let base = source.base()?;
        let page_url = Url::parse(&source.url).ok();
        let mut collector = ItemCollector::default();

        for anchor in document.select(&ANCHOR) {
            let Some(url) = anchor
                .value()
                .attr("href")
                .and_then(|href| resolve_link(&base, href))
            else {
                continue;
            };
            if !self.matches_pattern(&url) || self.is_listing(&url, page_url.as_ref()) {
                continue;
            }
            if collector.contains(url.as_str()) {
                continue;
            }

            let card = card_for(anchor);
            let Some(title) = title_candidates(anchor, card)
                .iter()
                .find_map(|t| acceptable_title(t, self.min_title_len))
            else {
                continue;
            };

            let description = description_within(card, &title);
            collector.push(RawExtractedItem {
                title,
                url: url.to_string(),
                date: date_within(card),
                description,
            });
        }

        debug!(source = %source.source_key, extractor = self.name, count = collector.len(), "Extracted links");
        Ok(collector.into_items())
    }
}

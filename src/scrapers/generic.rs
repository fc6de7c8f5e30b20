//! Best-effort extractor for sources without a bespoke rule set.
//!
//! Walks the source's `selector_hints` in order (or a default set) and reads a
//! link and headline out of every match. Precision is lower than a
//! [`LinkPatternExtractor`](super::LinkPatternExtractor); it keeps a new source
//! useful until one is written.

use super::SourceExtractor;
use super::dom::{
    card_for, date_within, description_within, first_anchor, heading_within, title_candidates,
    wraps_single_story,
};
use super::filters::{ItemCollector, MIN_TITLE_LEN, acceptable_title, resolve_link};
use crate::browser::PageSession;
use crate::config::SourceConfig;
use crate::error::ScrapeError;
use crate::models::RawExtractedItem;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_SELECTORS: [&str; 5] = [
    "article",
    ".news-item",
    ".press-release",
    "a[href*='news']",
    "a[href*='press']",
];

const READY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct GenericExtractor {
    min_title_len: usize,
}

impl Default for GenericExtractor {
    fn default() -> Self {
        Self {
            min_title_len: MIN_TITLE_LEN,
        }
    }
}

impl GenericExtractor {
    fn selectors(source: &SourceConfig) -> Vec<String> {
        if source.selector_hints.is_empty() {
            DEFAULT_SELECTORS.iter().map(|s| s.to_string()).collect()
        } else {
            source.selector_hints.clone()
        }
    }
}

impl SourceExtractor for GenericExtractor {
    fn name(&self) -> &str {
        "generic"
    }

    fn prepare(&self, page: &mut dyn PageSession, source: &SourceConfig) {
        let selectors = Self::selectors(source);
        if let Some(first) = selectors.first() {
            if !page.wait_for(first, READY_TIMEOUT) {
                debug!(source = %source.source_key, selector = %first, "Hint selector never appeared");
            }
        }
    }

    fn extract(
        &self,
        document: &Html,
        source: &SourceConfig,
    ) -> Result<Vec<RawExtractedItem>, ScrapeError> {
        let base = source.base()?;
        let mut collector = ItemCollector::default();

        for raw in Self::selectors(source) {
            let selector = match Selector::parse(&raw) {
                Ok(s) => s,
                Err(e) => {
                    warn!(source = %source.source_key, selector = %raw, error = %e, "Invalid selector hint; skipping");
                    continue;
                }
            };

            for element in document.select(&selector) {
                let Some(anchor) = first_anchor(element) else {
                    continue;
                };
                let Some(url) = anchor
                    .value()
                    .attr("href")
                    .and_then(|href| resolve_link(&base, href))
                else {
                    continue;
                };
                if collector.contains(url.as_str()) {
                    continue;
                }

                // a matched story container's own heading beats its link text
                let mut candidates = Vec::new();
                let card = if element.id() != anchor.id() && wraps_single_story(element, anchor) {
                    candidates.extend(heading_within(element));
                    element
                } else {
                    card_for(anchor)
                };
                candidates.extend(title_candidates(anchor, card));
                let Some(title) = candidates
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
        }

        debug!(source = %source.source_key, count = collector.len(), "Generic extraction finished");
        Ok(collector.into_items())
    }
}

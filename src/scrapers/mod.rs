//! Extractors that turn a rendered listing page into candidate items.
//!
//! Every source runs in two steps:
//!
//! 1. **Prepare**: with the page open, wait for the content to hydrate,
//!    dismiss cookie banners and scroll lazy lists ([`SourceExtractor::prepare`])
//! 2. **Extract**: read items out of the DOM snapshot ([`SourceExtractor::extract`])
//!
//! # Extractors
//!
//! | Extractor | Module | Used for |
//! |-----------|--------|----------|
//! | [`LinkPatternExtractor`] | [`press_links`] | Bank newsrooms with a bespoke rule set, see [`banks`] |
//! | [`GenericExtractor`] | [`generic`] | Any source without a bespoke rule set |
//! | feed reader | [`feed`] | Sources with a `feed_url`, no browser involved |
//!
//! [`ExtractorRegistry`] maps source keys to extractors and falls back to
//! [`GenericExtractor`] for unknown keys.

use crate::browser::PageSession;
use crate::config::SourceConfig;
use crate::error::ScrapeError;
use crate::models::RawExtractedItem;
use scraper::Html;
use std::collections::HashMap;
use std::sync::Arc;

pub mod banks;
pub mod dom;
pub mod feed;
pub mod filters;
pub mod generic;
pub mod press_links;

pub use generic::GenericExtractor;
pub use press_links::LinkPatternExtractor;

/// Site-specific knowledge of how to read one newsroom.
pub trait SourceExtractor: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Bring the freshly navigated page into a state worth snapshotting.
    ///
    /// Must not fail: waits that time out are logged and ignored.
    fn prepare(&self, page: &mut dyn PageSession, source: &SourceConfig);

    /// Read candidate items out of the rendered document, in DOM order.
    fn extract(
        &self,
        document: &Html,
        source: &SourceConfig,
    ) -> Result<Vec<RawExtractedItem>, ScrapeError>;
}

/// Source key → extractor, with a generic fallback.
#[derive(Clone)]
pub struct ExtractorRegistry {
    by_key: HashMap<String, Arc<dyn SourceExtractor>>,
    fallback: Arc<dyn SourceExtractor>,
}

impl ExtractorRegistry {
    /// A registry that sends every source to the generic extractor.
    pub fn generic_only() -> Self {
        Self {
            by_key: HashMap::new(),
            fallback: Arc::new(GenericExtractor::default()),
        }
    }

    /// The generic fallback plus every bank in [`banks`].
    pub fn with_builtin() -> Self {
        let mut registry = Self::generic_only();
        banks::register_all(&mut registry);
        registry
    }

    pub fn register<E: SourceExtractor + 'static>(&mut self, source_key: &str, extractor: E) {
        self.by_key
            .insert(source_key.to_ascii_lowercase(), Arc::new(extractor));
    }

    pub fn has_bespoke(&self, source_key: &str) -> bool {
        self.by_key.contains_key(&source_key.to_ascii_lowercase())
    }

    /// The extractor for `source_key`, or the generic one.
    pub fn for_source(&self, source_key: &str) -> Arc<dyn SourceExtractor> {
        self.by_key
            .get(&source_key.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(String::as_str)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.by_key.keys().collect();
        keys.sort();
        f.debug_struct("ExtractorRegistry")
            .field("bespoke", &keys)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

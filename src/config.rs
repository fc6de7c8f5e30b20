//! The site registry: which sources to scrape and how hard to try.
//!
//! A registry file has two top-level keys, `settings` and `sources`, and may be
//! YAML (`.yaml`/`.yml`) or JSON (`.json`):
//!
//! ```yaml
//! settings:
//!   max_items: 15
//!   delay_ms: 2000
//! sources:
//!   - source_key: HSBC
//!     display_name: HSBC Holdings
//!     url: https://www.hsbc.com/news-and-views/news
//!     region: UK
//!     country: United Kingdom
//! ```
//!
//! A default registry is compiled in from `config/sources.yaml`. Entries that
//! fail validation are logged and skipped; the rest of the registry still loads.

use crate::error::ScrapeError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const BUILTIN_REGISTRY: &str = include_str!("../config/sources.yaml");

/// Default desktop Chrome user agent presented to target sites.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-GB,en;q=0.9";

/// One scrapeable site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Short identifier, e.g. `"HSBC"`. Becomes the record's `authority`.
    pub source_key: String,
    pub display_name: String,
    /// Listing page to open.
    pub url: String,
    /// Base for relative links. Defaults to the origin of `url`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    /// CSS selectors for the generic extractor.
    #[serde(default)]
    pub selector_hints: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_area")]
    pub area: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default = "default_sectors")]
    pub sectors: Vec<String>,
    /// Overrides [`ScrapeSettings::max_items`] for this source.
    #[serde(default)]
    pub max_items: Option<usize>,
    /// RSS or Atom feed; read over HTTP instead of a browser when set.
    #[serde(default)]
    pub feed_url: Option<String>,
    /// Extra settle time after navigation, in milliseconds.
    #[serde(default)]
    pub wait_ms: Option<u64>,
}

fn default_category() -> String {
    "bank_news".to_string()
}

fn default_area() -> String {
    "Banking".to_string()
}

fn default_priority() -> String {
    "medium".to_string()
}

fn default_sectors() -> Vec<String> {
    vec!["Banking".to_string()]
}

impl SourceConfig {
    /// A source with default metadata. Mostly useful for tests and ad-hoc runs.
    pub fn new(source_key: &str, display_name: &str, url: &str) -> Self {
        Self {
            source_key: source_key.to_string(),
            display_name: display_name.to_string(),
            url: url.to_string(),
            base_url: None,
            region: String::new(),
            country: String::new(),
            selector_hints: Vec::new(),
            category: default_category(),
            area: default_area(),
            priority: default_priority(),
            sectors: default_sectors(),
            max_items: None,
            feed_url: None,
            wait_ms: None,
        }
    }

    /// The URL relative links are resolved against.
    pub fn base(&self) -> Result<Url, ScrapeError> {
        if let Some(base) = &self.base_url {
            return Url::parse(base).map_err(|e| ScrapeError::url(base, e));
        }
        let mut url = Url::parse(&self.url).map_err(|e| ScrapeError::url(&self.url, e))?;
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    pub fn is_bank(&self) -> bool {
        self.category == "bank_news"
    }

    pub fn settle_time(&self) -> Option<Duration> {
        self.wait_ms.map(Duration::from_millis)
    }
}

/// Knobs that apply to a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    /// Cap on records per source per run.
    pub max_items: usize,
    /// Politeness delay between sources.
    pub delay_ms: u64,
    pub navigation_timeout_secs: u64,
    /// Sources scraped at once. 1 means strictly sequential.
    pub concurrency: usize,
    pub headless: bool,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            max_items: 15,
            delay_ms: 2000,
            navigation_timeout_secs: 60,
            concurrency: 1,
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

impl ScrapeSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    settings: ScrapeSettings,
    #[serde(default)]
    sources: Vec<SourceConfig>,
}

/// Validated, ordered set of sources plus run settings.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    settings: ScrapeSettings,
    sources: Vec<SourceConfig>,
}

impl Registry {
    /// Build a registry, dropping invalid or duplicate entries.
    pub fn new(settings: ScrapeSettings, sources: Vec<SourceConfig>) -> Self {
        Self {
            settings,
            sources: validate(sources),
        }
    }

    /// The registry compiled into the binary.
    pub fn builtin() -> Result<Self, ScrapeError> {
        Self::from_yaml_str(BUILTIN_REGISTRY)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ScrapeError> {
        let file: RegistryFile = serde_yaml::from_str(s)?;
        Ok(Self::new(file.settings, file.sources))
    }

    pub fn from_json_str(s: &str) -> Result<Self, ScrapeError> {
        let file: RegistryFile = serde_json::from_str(s)?;
        Ok(Self::new(file.settings, file.sources))
    }

    /// Load a registry file, choosing the format by extension (YAML by default).
    #[instrument(level = "info", fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ScrapeError> {
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let registry = match ext.as_str() {
            "json" => Self::from_json_str(&content)?,
            _ => Self::from_yaml_str(&content)?,
        };
        info!(count = registry.sources.len(), "Loaded source registry");
        Ok(registry)
    }

    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    pub fn settings(&self) -> &ScrapeSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ScrapeSettings {
        &mut self.settings
    }

    /// Look up a source by key. Exact match first, then case-insensitive.
    pub fn get(&self, key: &str) -> Option<&SourceConfig> {
        self.sources
            .iter()
            .find(|s| s.source_key == key)
            .or_else(|| {
                self.sources
                    .iter()
                    .find(|s| s.source_key.eq_ignore_ascii_case(key))
            })
    }

    /// Keep only the named sources, in the order given. Unknown keys are logged.
    pub fn retain_keys(&mut self, keys: &[String]) {
        let mut picked = Vec::with_capacity(keys.len());
        for key in keys {
            match self.get(key) {
                Some(source) => picked.push(source.clone()),
                None => warn!(source = %key, "Unknown source key; skipping"),
            }
        }
        self.sources = picked;
    }

    /// Route feed sources through the page path too, e.g. when replaying saved pages.
    pub fn disable_feeds(&mut self) {
        for source in &mut self.sources {
            source.feed_url = None;
        }
    }
}

fn validate(sources: Vec<SourceConfig>) -> Vec<SourceConfig> {
    let mut seen = HashSet::new();
    let mut valid = Vec::with_capacity(sources.len());

    for source in sources {
        let key = source.source_key.trim();
        if key.is_empty() {
            warn!(url = %source.url, "Registry entry without source_key; skipping");
            continue;
        }
        if let Err(e) = check_url(&source.url) {
            warn!(source = %key, error = %e, "Registry entry has an invalid url; skipping");
            continue;
        }
        if let Err(e) = source.base() {
            warn!(source = %key, error = %e, "Registry entry has an invalid base_url; skipping");
            continue;
        }
        if let Some(feed) = &source.feed_url {
            if let Err(e) = check_url(feed) {
                warn!(source = %key, error = %e, "Registry entry has an invalid feed_url; skipping");
                continue;
            }
        }
        if !seen.insert(key.to_ascii_lowercase()) {
            warn!(source = %key, "Duplicate source_key in registry; keeping the first");
            continue;
        }
        debug!(source = %key, url = %source.url, "Registered source");
        valid.push(source);
    }
    valid
}

fn check_url(raw: &str) -> Result<(), ScrapeError> {
    let url = Url::parse(raw).map_err(|e| ScrapeError::url(raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ScrapeError::Registry(format!(
            "unsupported scheme {other:?} in {raw}"
        ))),
    }
}

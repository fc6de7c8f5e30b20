//! Sessions backed by saved HTML instead of a live browser.
//!
//! Used by the test suite and by `regwatch --replay-dir`, which replays pages
//! saved as `<dir>/<source_key>.html` through the normal extraction path.
//! Waits succeed when the selector matches the saved document.

use super::{BrowserLauncher, Navigation, PageSession, SessionOptions};
use crate::config::SourceConfig;
use crate::error::ScrapeError;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct FixturePage {
    html: String,
    timed_out: bool,
}

/// Serves canned pages keyed by URL.
///
/// Navigating to an unknown URL fails like an unresolvable host. Every
/// interaction is appended to a shared log, see [`FixtureLauncher::actions`].
#[derive(Debug, Clone, Default)]
pub struct FixtureLauncher {
    pages: Arc<HashMap<String, FixturePage>>,
    launch_error: Option<String>,
    actions: Arc<Mutex<Vec<String>>>,
}

impl FixtureLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: impl Into<String>) -> Self {
        self.insert(url, html.into(), false)
    }

    /// A page whose load times out but still leaves `html` in the DOM.
    pub fn with_slow_page(self, url: &str, html: impl Into<String>) -> Self {
        self.insert(url, html.into(), true)
    }

    /// A launcher that cannot start a browser at all.
    pub fn unavailable(message: &str) -> Self {
        Self {
            launch_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Load `<dir>/<source_key>.html` for each source that has one.
    pub fn from_dir(dir: &Path, sources: &[SourceConfig]) -> Result<Self, ScrapeError> {
        let mut launcher = Self::new();
        for source in sources {
            let path = dir.join(format!("{}.html", source.source_key));
            if !path.exists() {
                warn!(source = %source.source_key, path = %path.display(), "No saved page; source will yield nothing");
                continue;
            }
            let html = std::fs::read_to_string(&path)?;
            debug!(source = %source.source_key, bytes = html.len(), "Loaded saved page");
            launcher = launcher.with_page(&source.url, html);
        }
        info!(pages = launcher.pages.len(), dir = %dir.display(), "Replay pages loaded");
        Ok(launcher)
    }

    /// Everything sessions did so far, in order (`"navigate <url>"`, `"click <sel>"`, ...).
    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn insert(mut self, url: &str, html: String, timed_out: bool) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), FixturePage { html, timed_out });
        self
    }
}

impl BrowserLauncher for FixtureLauncher {
    fn open(&self, _options: &SessionOptions) -> Result<Box<dyn PageSession>, ScrapeError> {
        if let Some(message) = &self.launch_error {
            return Err(ScrapeError::Browser(message.clone()));
        }
        Ok(Box::new(FixtureSession {
            pages: Arc::clone(&self.pages),
            actions: Arc::clone(&self.actions),
            current: None,
        }))
    }

    fn source_type(&self) -> &'static str {
        "replay"
    }
}

struct FixtureSession {
    pages: Arc<HashMap<String, FixturePage>>,
    actions: Arc<Mutex<Vec<String>>>,
    current: Option<String>,
}

impl FixtureSession {
    fn record(&self, action: String) {
        if let Ok(mut actions) = self.actions.lock() {
            actions.push(action);
        }
    }

    fn matches(&self, selector: &str) -> bool {
        let (Some(html), Ok(selector)) = (self.current.as_deref(), Selector::parse(selector)) else {
            return false;
        };
        Html::parse_document(html).select(&selector).next().is_some()
    }
}

impl PageSession for FixtureSession {
    fn navigate(&mut self, url: &str) -> Result<Navigation, ScrapeError> {
        self.record(format!("navigate {url}"));
        let page = self
            .pages
            .get(url)
            .ok_or_else(|| ScrapeError::Browser(format!("net::ERR_NAME_NOT_RESOLVED at {url}")))?;
        self.current = Some(page.html.clone());
        if page.timed_out {
            Ok(Navigation::TimedOut)
        } else {
            Ok(Navigation::Loaded)
        }
    }

    fn wait_for(&mut self, selector: &str, _timeout: Duration) -> bool {
        self.record(format!("wait {selector}"));
        self.matches(selector)
    }

    fn click(&mut self, selector: &str) -> bool {
        let found = self.matches(selector);
        if found {
            self.record(format!("click {selector}"));
        }
        found
    }

    fn run_script(&mut self, script: &str) -> Result<(), ScrapeError> {
        self.record(format!("script {script}"));
        Ok(())
    }

    fn pause(&mut self, duration: Duration) {
        self.record(format!("pause {}ms", duration.as_millis()));
    }

    fn content(&mut self) -> Result<String, ScrapeError> {
        Ok(self.current.clone().unwrap_or_default())
    }
}

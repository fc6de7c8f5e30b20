//! Browser sessions: one isolated, hardened page per scraped source.
//!
//! The pipeline never talks to a browser directly. It asks a
//! [`BrowserLauncher`] for a fresh [`PageSession`] using [`SessionOptions`],
//! drives it (navigate, wait, click, scroll) and takes an HTML snapshot for
//! the extractors. Dropping the session closes the browser.
//!
//! # Implementations
//!
//! | Launcher | Module | Use |
//! |----------|--------|-----|
//! | [`ChromeLauncher`] | [`chrome`] | Headless Chrome over CDP |
//! | [`FixtureLauncher`] | [`fixture`] | Canned HTML for tests and `--replay-dir` |

use crate::config::{DEFAULT_ACCEPT_LANGUAGE, DEFAULT_USER_AGENT, ScrapeSettings};
use crate::error::ScrapeError;
use std::time::Duration;

pub mod chrome;
pub mod fixture;

pub use chrome::ChromeLauncher;
pub use fixture::FixtureLauncher;

/// Scrolls to the bottom of the page so lazy-loaded lists render.
pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Request types a session can refuse to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Image,
    Font,
    Media,
    Stylesheet,
}

/// Launch and page configuration for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub headless: bool,
    /// Chrome's sandbox does not work in most containers; off by default.
    pub sandbox: bool,
    pub user_agent: String,
    pub accept_language: String,
    pub blocked_resources: Vec<ResourceKind>,
    pub navigation_timeout: Duration,
    pub window_size: (u32, u32),
    pub extra_args: Vec<String>,
    /// Patch `navigator` and friends before any page script runs.
    pub stealth: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            blocked_resources: vec![ResourceKind::Image, ResourceKind::Font, ResourceKind::Media],
            navigation_timeout: Duration::from_secs(60),
            window_size: (1366, 900),
            extra_args: Vec::new(),
            stealth: true,
        }
    }
}

impl SessionOptions {
    pub fn builder() -> SessionOptionsBuilder {
        SessionOptionsBuilder::default()
    }

    /// Options derived from run settings.
    pub fn from_settings(settings: &ScrapeSettings) -> Self {
        Self::builder()
            .headless(settings.headless)
            .user_agent(&settings.user_agent)
            .accept_language(&settings.accept_language)
            .navigation_timeout(settings.navigation_timeout())
            .build()
    }

    pub fn blocks(&self, kind: ResourceKind) -> bool {
        self.blocked_resources.contains(&kind)
    }
}

/// Builder for [`SessionOptions`]; unset fields keep their defaults.
#[derive(Debug, Clone, Default)]
pub struct SessionOptionsBuilder {
    options: SessionOptions,
}

impl SessionOptionsBuilder {
    pub fn headless(mut self, headless: bool) -> Self {
        self.options.headless = headless;
        self
    }

    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.options.sandbox = sandbox;
        self
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.options.user_agent = user_agent.to_string();
        self
    }

    pub fn accept_language(mut self, accept_language: &str) -> Self {
        self.options.accept_language = accept_language.to_string();
        self
    }

    pub fn block(mut self, kind: ResourceKind) -> Self {
        if !self.options.blocked_resources.contains(&kind) {
            self.options.blocked_resources.push(kind);
        }
        self
    }

    pub fn allow(mut self, kind: ResourceKind) -> Self {
        self.options.blocked_resources.retain(|k| *k != kind);
        self
    }

    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.options.navigation_timeout = timeout;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.options.window_size = (width, height);
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.options.extra_args.push(arg.to_string());
        self
    }

    pub fn stealth(mut self, stealth: bool) -> Self {
        self.options.stealth = stealth;
        self
    }

    pub fn build(self) -> SessionOptions {
        self.options
    }
}

/// Outcome of a navigation that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Loaded,
    /// The load did not finish in time; the DOM may be partial.
    TimedOut,
}

/// A live page in an isolated browser.
///
/// Waits and clicks report success as `bool`: a missing element is an expected
/// outcome on these sites, not an error.
pub trait PageSession {
    fn navigate(&mut self, url: &str) -> Result<Navigation, ScrapeError>;

    /// Wait until `selector` matches, up to `timeout`. `false` on timeout.
    fn wait_for(&mut self, selector: &str, timeout: Duration) -> bool;

    /// Click the first element matching `selector`, if any.
    fn click(&mut self, selector: &str) -> bool;

    /// Evaluate a script in the page, ignoring its return value.
    fn run_script(&mut self, script: &str) -> Result<(), ScrapeError>;

    fn pause(&mut self, duration: Duration);

    /// The current serialized DOM.
    fn content(&mut self) -> Result<String, ScrapeError>;
}

/// Produces fresh sessions. Shared across the batch, so `Send + Sync`.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, options: &SessionOptions) -> Result<Box<dyn PageSession>, ScrapeError>;

    /// Recorded as `raw_data.source_type` on records.
    fn source_type(&self) -> &'static str {
        "browser"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_block_heavy_resources() {
        let options = SessionOptions::default();
        assert!(!options.sandbox);
        assert!(options.headless);
        assert!(options.blocks(ResourceKind::Image));
        assert!(options.blocks(ResourceKind::Font));
        assert!(options.blocks(ResourceKind::Media));
        assert!(!options.blocks(ResourceKind::Stylesheet));
        assert_eq!(options.navigation_timeout, Duration::from_secs(60));
        assert!(options.stealth);
    }

    #[test]
    fn test_stealth_can_be_turned_off() {
        let options = SessionOptions::builder().stealth(false).build();
        assert!(!options.stealth);
        let from_settings = SessionOptions::from_settings(&ScrapeSettings::default());
        assert!(from_settings.stealth);
    }

    #[test]
    fn test_builder_overrides() {
        let options = SessionOptions::builder()
            .navigation_timeout(Duration::from_secs(5))
            .allow(ResourceKind::Image)
            .block(ResourceKind::Stylesheet)
            .block(ResourceKind::Stylesheet)
            .arg("--lang=en-GB")
            .build();
        assert_eq!(options.navigation_timeout, Duration::from_secs(5));
        assert!(!options.blocks(ResourceKind::Image));
        assert_eq!(
            options
                .blocked_resources
                .iter()
                .filter(|k| **k == ResourceKind::Stylesheet)
                .count(),
            1
        );
        assert_eq!(options.extra_args, vec!["--lang=en-GB".to_string()]);
    }

    #[test]
    fn test_from_settings() {
        let settings = ScrapeSettings {
            navigation_timeout_secs: 30,
            headless: false,
            ..ScrapeSettings::default()
        };
        let options = SessionOptions::from_settings(&settings);
        assert_eq!(options.navigation_timeout, Duration::from_secs(30));
        assert!(!options.headless);
        assert_eq!(options.user_agent, DEFAULT_USER_AGENT);
    }
}

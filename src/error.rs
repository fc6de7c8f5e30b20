//! Error type shared by the registry loader, browser sessions and extractors.
//!
//! Errors never cross the per-source boundary in [`crate::pipeline`]; they are
//! logged there and the source contributes zero records.

use thiserror::Error;

/// Everything that can go wrong while loading sources or scraping one of them.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The headless browser failed to launch, open a tab or talk CDP.
    #[error("browser error: {0}")]
    Browser(String),

    /// A URL in the registry or on a page could not be parsed.
    #[error("invalid url {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The registry file is readable but semantically wrong.
    #[error("registry error: {0}")]
    Registry(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// An RSS or Atom document could not be read.
    #[error("feed error: {0}")]
    Feed(String),

    /// The blocking scrape task panicked or was cancelled.
    #[error("scrape task failed: {0}")]
    Task(String),
}

impl ScrapeError {
    pub fn browser(e: impl std::fmt::Display) -> Self {
        ScrapeError::Browser(e.to_string())
    }

    pub fn url(url: &str, source: url::ParseError) -> Self {
        ScrapeError::Url {
            url: url.to_string(),
            source,
        }
    }
}

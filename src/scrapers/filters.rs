//! Heuristics every extractor applies to candidate links.
//!
//! A candidate survives when its title is long enough and is not a navigation
//! label, and its URL resolves to an http(s) page off social media. Within one
//! pass, [`ItemCollector`] keeps the first item per URL.

use crate::models::RawExtractedItem;
use crate::utils::collapse_whitespace;
use std::collections::HashSet;
use url::Url;

/// Titles shorter than this are navigation, not news.
pub const MIN_TITLE_LEN: usize = 15;

/// Substrings that mark a link as navigation wherever they appear.
const NAV_PHRASES: [&str; 10] = [
    "view all",
    "see more",
    "read more",
    "load more",
    "show more",
    "learn more",
    "find out more",
    "see all",
    "back to top",
    "skip to",
];

/// Titles that are navigation only when they are the whole title.
const NAV_LABELS: [&str; 14] = [
    "press releases",
    "press release",
    "news releases",
    "news release",
    "latest news",
    "all news",
    "all press releases",
    "newsroom",
    "news room",
    "media centre",
    "media center",
    "news and insights",
    "news & insights",
    "news and views",
];

const SOCIAL_DOMAINS: [&str; 12] = [
    "facebook.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "instagram.com",
    "youtube.com",
    "youtu.be",
    "tiktok.com",
    "pinterest.com",
    "whatsapp.com",
    "threads.net",
    "t.co",
];

pub fn is_navigational(title: &str) -> bool {
    let lower = title.trim().to_lowercase();
    NAV_PHRASES.iter().any(|p| lower.contains(p)) || NAV_LABELS.iter().any(|l| lower == *l)
}

/// Clean `raw` and return it if it is usable as a headline.
///
/// `min_len` is the site's own minimum; it never goes below [`MIN_TITLE_LEN`].
pub fn acceptable_title(raw: &str, min_len: usize) -> Option<String> {
    let title = collapse_whitespace(raw);
    if title.chars().count() < min_len.max(MIN_TITLE_LEN) || is_navigational(&title) {
        return None;
    }
    Some(title)
}

pub fn is_social(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        let host = host.trim_start_matches("www.").to_ascii_lowercase();
        SOCIAL_DOMAINS
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{d}")))
    })
}

/// Resolve `href` against `base`, dropping anything that is not a web page.
///
/// The fragment is removed, so `/a#top` and `/a` are the same link.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    if is_social(&url) {
        return None;
    }
    Some(url)
}

/// Collects items in discovery order, keeping the first one per URL.
#[derive(Debug, Default)]
pub struct ItemCollector {
    seen: HashSet<String>,
    items: Vec<RawExtractedItem>,
}

impl ItemCollector {
    /// Add `item` unless its URL was already collected. Returns whether it was added.
    pub fn push(&mut self, item: RawExtractedItem) -> bool {
        if !self.seen.insert(item.url.clone()) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<RawExtractedItem> {
        self.items
    }
}

//! Data models for scraped items and the records handed to storage.
//!
//! This module defines the two shapes that flow through the pipeline:
//! - [`RawExtractedItem`]: what an extractor pulls off a single page load
//! - [`NormalizedUpdateRecord`]: the common record every source is converted
//!   into before it leaves the crate, with its nested [`RawData`]
//!
//! Records serialize with snake_case keys; the persistence layer reads them
//! as-is.

use serde::{Deserialize, Serialize};

/// A candidate news item as found on a page.
///
/// Items are transient: they live for one extraction pass and are discarded
/// once normalized. The `date` is whatever free text sat next to the link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExtractedItem {
    /// Human-readable headline.
    pub title: String,
    /// Absolute URL, fragment stripped.
    pub url: String,
    /// Unparsed date text, if the page showed one.
    pub date: Option<String>,
    /// Teaser or summary text, if the page showed one.
    pub description: Option<String>,
}

/// A normalized regulatory or bank update.
///
/// # Invariants
///
/// - `url` is an absolute http(s) link without a `#` fragment and never points
///   at a social-media domain
/// - `headline` is at least 15 characters and is not a navigation label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedUpdateRecord {
    pub headline: String,
    pub url: String,
    /// The source key, e.g. `"HSBC"`.
    pub authority: String,
    pub area: String,
    /// Category tag, `"bank_news"` for most sources.
    pub source_category: String,
    pub source_description: String,
    /// When this run fetched the item (RFC 3339, UTC).
    pub fetched_date: String,
    /// Publication date (RFC 3339, UTC) or `null` when the text did not parse.
    pub published_date: Option<String>,
    pub raw_data: RawData,
}

/// Source metadata carried along with each record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    /// How the item was obtained: `"browser"`, `"feed"` or `"replay"`.
    pub source_type: String,
    pub source_key: String,
    pub country: String,
    pub region: String,
    pub priority: String,
    pub summary: String,
    pub sectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_news: Option<BankNews>,
}

/// Extra detail for records coming from bank newsrooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankNews {
    pub bank_name: String,
    /// The date text exactly as it appeared on the page.
    pub original_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> NormalizedUpdateRecord {
        NormalizedUpdateRecord {
            headline: "Barclays reports full year results".to_string(),
            url: "https://home.barclays/news/2025/02/fy-results/".to_string(),
            authority: "Barclays".to_string(),
            area: "Banking".to_string(),
            source_category: "bank_news".to_string(),
            source_description: "Barclays - News & Press Releases".to_string(),
            fetched_date: "2025-02-14T09:00:00+00:00".to_string(),
            published_date: None,
            raw_data: RawData {
                source_type: "browser".to_string(),
                source_key: "Barclays".to_string(),
                country: "United Kingdom".to_string(),
                region: "UK".to_string(),
                priority: "medium".to_string(),
                summary: "Barclays reports full year results".to_string(),
                sectors: vec!["Banking".to_string()],
                bank_news: None,
            },
        }
    }

    #[test]
    fn test_record_serializes_snake_case_and_null_date() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["source_category"], "bank_news");
        assert!(json["published_date"].is_null());
        assert_eq!(json["raw_data"]["source_key"], "Barclays");
        assert!(json["raw_data"].get("bank_news").is_none());
    }

    #[test]
    fn test_bank_news_is_emitted_when_present() {
        let mut r = record();
        r.raw_data.bank_news = Some(BankNews {
            bank_name: "Barclays".to_string(),
            original_date: Some("14 February 2025".to_string()),
        });
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"bank_name\":\"Barclays\""));
        assert!(json.contains("14 February 2025"));
    }

    #[test]
    fn test_record_deserializes_without_bank_news() {
        let json = serde_json::to_string(&record()).unwrap();
        let back: NormalizedUpdateRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record());
    }
}

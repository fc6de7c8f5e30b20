//! Turning raw items into [`NormalizedUpdateRecord`]s.

use crate::config::SourceConfig;
use crate::dates::parse_date_from_text;
use crate::models::{BankNews, NormalizedUpdateRecord, RawData, RawExtractedItem};
use crate::scrapers::filters::{MIN_TITLE_LEN, acceptable_title, is_social};
use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

/// Tag `item` with its source's metadata and parse its date.
///
/// Returns `None` for items that break the record invariants (relative or
/// non-web URL, social link, short or navigational headline). Extractors
/// already filter these; this is the last gate before records leave the crate.
pub fn normalize(
    item: RawExtractedItem,
    source: &SourceConfig,
    source_type: &str,
    fetched_at: DateTime<Utc>,
) -> Option<NormalizedUpdateRecord> {
    let Some(url) = clean_url(&item.url) else {
        debug!(source = %source.source_key, url = %item.url, "Dropping item with unusable url");
        return None;
    };
    let Some(headline) = acceptable_title(&item.title, MIN_TITLE_LEN) else {
        debug!(source = %source.source_key, title = %item.title, "Dropping item with unusable headline");
        return None;
    };

    let published_date = item
        .date
        .as_deref()
        .and_then(parse_date_from_text)
        .map(|d| d.to_rfc3339());
    if published_date.is_none() {
        if let Some(text) = &item.date {
            debug!(source = %source.source_key, date = %text, "Unparseable date; leaving it null");
        }
    }

    let bank_news = source.is_bank().then(|| BankNews {
        bank_name: source.display_name.clone(),
        original_date: item.date.clone(),
    });

    Some(NormalizedUpdateRecord {
        raw_data: RawData {
            source_type: source_type.to_string(),
            source_key: source.source_key.clone(),
            country: source.country.clone(),
            region: source.region.clone(),
            priority: source.priority.clone(),
            summary: item.description.unwrap_or_else(|| headline.clone()),
            sectors: source.sectors.clone(),
            bank_news,
        },
        headline,
        url,
        authority: source.source_key.clone(),
        area: source.area.clone(),
        source_category: source.category.clone(),
        source_description: format!("{} - News & Press Releases", source.display_name),
        fetched_date: fetched_at.to_rfc3339(),
        published_date,
    })
}

fn clean_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") || is_social(&url) {
        return None;
    }
    url.set_fragment(None);
    Some(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fetched() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 9, 30, 0).unwrap()
    }

    fn item(date: Option<&str>) -> RawExtractedItem {
        RawExtractedItem {
            title: "Lloyds Banking Group announces new chair".to_string(),
            url: "https://www.lloydsbankinggroup.com/media/press-releases/2025/new-chair.html".to_string(),
            date: date.map(str::to_string),
            description: None,
        }
    }

    fn lloyds() -> SourceConfig {
        let mut s = SourceConfig::new(
            "Lloyds",
            "Lloyds Banking Group",
            "https://www.lloydsbankinggroup.com/media/press-releases.html",
        );
        s.country = "United Kingdom".to_string();
        s.region = "UK".to_string();
        s
    }

    #[test]
    fn test_bank_record_fields() {
        let record = normalize(item(Some("4 March 2025")), &lloyds(), "browser", fetched()).unwrap();
        assert_eq!(record.authority, "Lloyds");
        assert_eq!(record.area, "Banking");
        assert_eq!(record.source_category, "bank_news");
        assert_eq!(record.source_description, "Lloyds Banking Group - News & Press Releases");
        assert_eq!(record.fetched_date, "2025-03-05T09:30:00+00:00");
        assert_eq!(record.published_date.as_deref(), Some("2025-03-04T00:00:00+00:00"));
        assert_eq!(record.raw_data.summary, record.headline);
        assert_eq!(record.raw_data.country, "United Kingdom");
        let bank = record.raw_data.bank_news.unwrap();
        assert_eq!(bank.bank_name, "Lloyds Banking Group");
        assert_eq!(bank.original_date.as_deref(), Some("4 March 2025"));
    }

    #[test]
    fn test_unparseable_date_is_null() {
        let record = normalize(item(Some("TBD")), &lloyds(), "browser", fetched()).unwrap();
        assert!(record.published_date.is_none());
        assert_eq!(
            record.raw_data.bank_news.unwrap().original_date.as_deref(),
            Some("TBD")
        );
    }

    #[test]
    fn test_regulator_has_no_bank_news() {
        let mut source = SourceConfig::new("FCA", "Financial Conduct Authority", "https://www.fca.org.uk/news");
        source.category = "regulator_news".to_string();
        source.area = "Regulation".to_string();
        let mut raw = item(None);
        raw.description = Some("The FCA has set out its plans.".to_string());
        let record = normalize(raw, &source, "feed", fetched()).unwrap();
        assert!(record.raw_data.bank_news.is_none());
        assert_eq!(record.raw_data.source_type, "feed");
        assert_eq!(record.raw_data.summary, "The FCA has set out its plans.");
        assert_eq!(record.area, "Regulation");
    }

    #[test]
    fn test_invariant_breaking_items_are_dropped() {
        let mut relative = item(None);
        relative.url = "/media/press-releases/x".to_string();
        assert!(normalize(relative, &lloyds(), "browser", fetched()).is_none());

        let mut social = item(None);
        social.url = "https://twitter.com/lloydsbank/status/1".to_string();
        assert!(normalize(social, &lloyds(), "browser", fetched()).is_none());

        let mut nav = item(None);
        nav.title = "View all press releases".to_string();
        assert!(normalize(nav, &lloyds(), "browser", fetched()).is_none());
    }

    #[test]
    fn test_fragment_is_stripped() {
        let mut raw = item(None);
        raw.url.push_str("#main");
        let record = normalize(raw, &lloyds(), "browser", fetched()).unwrap();
        assert!(!record.url.contains('#'));
    }
}

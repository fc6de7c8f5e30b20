//! RSS and Atom sources.
//!
//! Regulators that publish a feed are read over plain HTTP instead of a
//! browser session. Feed entries go through the same link and headline
//! filters as scraped links, so a feed can never smuggle in a social link or
//! a "Read more" title.

use super::filters::{ItemCollector, MIN_TITLE_LEN, acceptable_title, resolve_link};
use crate::config::SourceConfig;
use crate::error::ScrapeError;
use crate::models::RawExtractedItem;
use crate::utils::{collapse_whitespace, truncate_for_log};
use quick_xml::de::from_str;
use scraper::Html;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<AtomText>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    /// The `alternate` link, or the first link without a `rel`.
    fn page_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .or_else(|| self.links.iter().find(|l| l.rel.is_none()))
            .and_then(|l| l.href.as_deref())
    }
}

/// Download `feed_url` and read its entries.
#[instrument(level = "info", skip(client, source), fields(source = %source.source_key))]
pub async fn fetch_feed(
    client: &reqwest::Client,
    source: &SourceConfig,
    feed_url: &str,
) -> Result<Vec<RawExtractedItem>, ScrapeError> {
    let body = client
        .get(feed_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    debug!(bytes = body.len(), "Downloaded feed");
    let items = parse_feed(&body, source).inspect_err(|e| {
        warn!(error = %e, preview = %truncate_for_log(&body, 200), "Feed did not parse");
    })?;
    info!(count = items.len(), "Parsed feed");
    Ok(items)
}

/// Parse an RSS 2.0 or Atom document into candidate items, in document order.
pub fn parse_feed(xml: &str, source: &SourceConfig) -> Result<Vec<RawExtractedItem>, ScrapeError> {
    let xml = scrub_html_entities(xml);
    let entries = if xml.contains("<rss") {
        let rss: Rss = from_str(&xml).map_err(|e| ScrapeError::Feed(e.to_string()))?;
        rss.channel
            .items
            .into_iter()
            .map(|item| Entry {
                title: item.title,
                link: item.link.or(item.guid),
                date: item.pub_date,
                description: item.description,
            })
            .collect::<Vec<_>>()
    } else if xml.contains("<feed") {
        let feed: AtomFeed = from_str(&xml).map_err(|e| ScrapeError::Feed(e.to_string()))?;
        feed.entries
            .into_iter()
            .map(|entry| Entry {
                link: entry.page_link().map(str::to_string),
                title: entry.title.map(|t| t.value),
                date: entry.published.or(entry.updated),
                description: entry.summary.map(|s| s.value),
            })
            .collect()
    } else {
        return Err(ScrapeError::Feed("neither RSS nor Atom".to_string()));
    };

    let base = source.base()?;
    let mut collector = ItemCollector::default();
    for entry in entries {
        let Some(url) = entry.link.as_deref().and_then(|l| resolve_link(&base, l)) else {
            continue;
        };
        let Some(title) = entry
            .title
            .as_deref()
            .and_then(|t| acceptable_title(&strip_markup(t), MIN_TITLE_LEN))
        else {
            continue;
        };
        collector.push(RawExtractedItem {
            title,
            url: url.to_string(),
            date: entry.date.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            description: entry
                .description
                .map(|d| strip_markup(&d))
                .filter(|d| !d.is_empty()),
        });
    }
    Ok(collector.into_items())
}

struct Entry {
    title: Option<String>,
    link: Option<String>,
    date: Option<String>,
    description: Option<String>,
}

/// Feed descriptions are often escaped HTML.
fn strip_markup(s: &str) -> String {
    if !s.contains('<') {
        return collapse_whitespace(s);
    }
    let fragment = Html::parse_fragment(s);
    collapse_whitespace(&fragment.root_element().text().collect::<String>())
}

/// HTML named entities are not valid XML; replace the usual suspects.
fn scrub_html_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&pound;", "£")
        .replace("&euro;", "€")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceConfig {
        let mut s = SourceConfig::new("FCA", "Financial Conduct Authority", "https://www.fca.org.uk/news");
        s.category = "regulator_news".to_string();
        s
    }

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>FCA news</title>
    <link>https://www.fca.org.uk/news</link>
    <item>
      <title>FCA fines bank &pound;10m for financial crime control failings</title>
      <link>https://www.fca.org.uk/news/press-releases/fca-fines-bank</link>
      <pubDate>Tue, 04 Mar 2025 10:00:00 GMT</pubDate>
      <description>&lt;p&gt;The FCA has fined a bank&amp;nbsp;for weak controls.&lt;/p&gt;</description>
    </item>
    <item>
      <title>Read more</title>
      <link>https://www.fca.org.uk/news</link>
    </item>
    <item>
      <title>Consultation on the consumer duty &ndash; next steps</title>
      <link>/publications/consultation-papers/cp25-3</link>
    </item>
    <item>
      <title>Follow us on LinkedIn for the latest</title>
      <link>https://www.linkedin.com/company/fca</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss() {
        let items = parse_feed(RSS, &source()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0].title,
            "FCA fines bank £10m for financial crime control failings"
        );
        assert_eq!(items[0].date.as_deref(), Some("Tue, 04 Mar 2025 10:00:00 GMT"));
        assert_eq!(
            items[0].description.as_deref(),
            Some("The FCA has fined a bank for weak controls.")
        );
        assert_eq!(
            items[1].url,
            "https://www.fca.org.uk/publications/consultation-papers/cp25-3"
        );
        assert_eq!(items[1].title, "Consultation on the consumer duty - next steps");
    }

    #[test]
    fn test_parse_atom() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Bank of England news</title>
  <entry>
    <title type="text">Bank Rate maintained at 4.5% - March 2025</title>
    <link rel="self" href="https://www.bankofengland.co.uk/feeds/1"/>
    <link rel="alternate" href="https://www.bankofengland.co.uk/monetary-policy-summary-and-minutes/2025/march-2025"/>
    <updated>2025-03-20T12:00:00Z</updated>
    <summary>The Monetary Policy Committee voted to maintain Bank Rate.</summary>
  </entry>
  <entry>
    <title>Short</title>
    <link href="https://www.bankofengland.co.uk/x"/>
  </entry>
</feed>"#;
        let items = parse_feed(atom, &source()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].url,
            "https://www.bankofengland.co.uk/monetary-policy-summary-and-minutes/2025/march-2025"
        );
        assert_eq!(items[0].date.as_deref(), Some("2025-03-20T12:00:00Z"));
        assert_eq!(
            items[0].description.as_deref(),
            Some("The Monetary Policy Committee voted to maintain Bank Rate.")
        );
    }

    #[test]
    fn test_duplicate_links_in_feed() {
        let rss = r#"<rss><channel>
            <item><title>Statement on market conditions today</title><link>https://www.fca.org.uk/news/a</link></item>
            <item><title>Statement on market conditions again</title><link>https://www.fca.org.uk/news/a#x</link></item>
        </channel></rss>"#;
        let items = parse_feed(rss, &source()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Statement on market conditions today");
    }

    #[test]
    fn test_not_a_feed() {
        assert!(parse_feed("<html><body>nope</body></html>", &source()).is_err());
    }

    #[test]
    fn test_empty_channel() {
        let rss = "<rss><channel><title>Nothing yet</title></channel></rss>";
        assert!(parse_feed(rss, &source()).unwrap().is_empty());
    }
}

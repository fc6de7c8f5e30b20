//! Bespoke extraction rules for bank newsrooms.
//!
//! One function per bank. The rules encode how each newsroom links its
//! stories, which section roots to skip, what to wait for while the list
//! hydrates and any interaction needed first. Site markup changes often;
//! adjust the function for that bank and leave the others alone.

use super::{ExtractorRegistry, LinkPatternExtractor};

/// Register every bank in this module under its source key.
pub fn register_all(registry: &mut ExtractorRegistry) {
    registry.register("HSBC", hsbc());
    registry.register("Barclays", barclays());
    registry.register("Lloyds", lloyds());
    registry.register("NatWest", natwest());
    registry.register("SantanderUK", santander_uk());
    registry.register("StandardChartered", standard_chartered());
    registry.register("JPMorgan", jpmorgan());
    registry.register("GoldmanSachs", goldman_sachs());
    registry.register("Citi", citi());
    registry.register("BankOfAmerica", bank_of_america());
    registry.register("WellsFargo", wells_fargo());
    registry.register("MorganStanley", morgan_stanley());
    registry.register("DeutscheBank", deutsche_bank());
    registry.register("UBS", ubs());
}

pub fn hsbc() -> LinkPatternExtractor {
    LinkPatternExtractor::new("hsbc", &["/news-and-views/news/", "/media/media-releases/"])
        .listing_paths(&["/news-and-views/news", "/media/media-releases"])
        .ready_when("a[href*='/news-and-views/news/']", 15)
        .min_title_len(20)
}

pub fn barclays() -> LinkPatternExtractor {
    LinkPatternExtractor::new("barclays", &["/news/20", "/news/press-releases/"])
        .listing_paths(&["/news", "/news/press-releases"])
        .ready_when("a[href*='/news/']", 10)
}

pub fn lloyds() -> LinkPatternExtractor {
    LinkPatternExtractor::new("lloyds", &["/media/press-releases/20"])
        .listing_paths(&["/media/press-releases", "/media/press-releases.html"])
        .ready_when("a[href*='/media/press-releases/']", 10)
}

pub fn natwest() -> LinkPatternExtractor {
    LinkPatternExtractor::new("natwest", &["/press-releases/20", "/news-room/press-releases/"])
        .listing_paths(&[
            "/news-and-insights/news-room/press-releases",
            "/news-and-insights/news-room/press-releases.html",
        ])
        .ready_when("a[href*='/press-releases/']", 10)
}

pub fn santander_uk() -> LinkPatternExtractor {
    LinkPatternExtractor::new("santander_uk", &["/press-releases/"])
        .listing_paths(&["/about-santander/media-centre/press-releases"])
        .accept_cookies("#onetrust-accept-btn-handler")
        .ready_when("a[href*='/press-releases/']", 10)
        .scroll(2, 1500)
}

pub fn standard_chartered() -> LinkPatternExtractor {
    LinkPatternExtractor::new("standard_chartered", &["/press-release/", "/press-releases/"])
        .listing_paths(&["/en/press-releases", "/en/media/press-releases"])
        .ready_when("a[href*='press-release']", 10)
}

pub fn jpmorgan() -> LinkPatternExtractor {
    LinkPatternExtractor::new("jpmorgan", &["/newsroom/press-releases/", "/ir/news/"])
        .listing_paths(&["/newsroom/press-releases", "/ir/news"])
        .ready_when("a[href*='/newsroom/press-releases/']", 15)
        .min_title_len(20)
}

pub fn goldman_sachs() -> LinkPatternExtractor {
    LinkPatternExtractor::new("goldman_sachs", &["/pressroom/press-releases/"])
        .listing_paths(&["/pressroom", "/pressroom/press-releases"])
        .ready_when("a[href*='/pressroom/press-releases/']", 10)
}

pub fn citi() -> LinkPatternExtractor {
    LinkPatternExtractor::new("citi", &["/global/news/press-release/", "/global/news/perspective/"])
        .listing_paths(&["/global/news/press-release", "/global/news"])
        .ready_when("a[href*='/global/news/']", 15)
}

pub fn bank_of_america() -> LinkPatternExtractor {
    LinkPatternExtractor::new("bank_of_america", &["/content/newsroom/press-releases/20"])
        .listing_paths(&["/content/newsroom/press-releases", "/content/newsroom/press-releases.html"])
        .ready_when("a[href*='/press-releases/']", 10)
}

pub fn wells_fargo() -> LinkPatternExtractor {
    LinkPatternExtractor::new("wells_fargo", &["/news-releases/"])
        .listing_paths(&["/news-releases", "/news-releases/default.aspx"])
        .ready_when("a[href*='/news-releases/']", 10)
        .min_title_len(20)
}

pub fn morgan_stanley() -> LinkPatternExtractor {
    LinkPatternExtractor::new("morgan_stanley", &["/press-releases/"])
        .listing_paths(&["/press-releases"])
        .ready_when("a[href*='/press-releases/']", 10)
}

pub fn deutsche_bank() -> LinkPatternExtractor {
    LinkPatternExtractor::new("deutsche_bank", &["/news/detail/"])
        .listing_paths(&["/news"])
        .ready_when("a[href*='/news/detail/']", 10)
}

/// UBS renders its news list lazily as the page scrolls.
pub fn ubs() -> LinkPatternExtractor {
    LinkPatternExtractor::new("ubs", &["/media/global-news/", "/media/display-page-ndp/"])
        .listing_paths(&["/global/en/media/global-news.html", "/global/en/media/global-news"])
        .ready_when("a[href*='/media/']", 15)
        .scroll(3, 2000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserLauncher, FixtureLauncher, SessionOptions};
    use crate::config::SourceConfig;
    use crate::scrapers::SourceExtractor;
    use scraper::Html;

    #[test]
    fn test_hsbc_newsroom() {
        let source = SourceConfig::new("HSBC", "HSBC Holdings", "https://www.hsbc.com/news-and-views/news");
        let html = r#"
            <div class="news-list">
              <div class="news-card">
                <a href="/news-and-views/news/media-releases/2025/hsbc-holdings-plc-board-change">
                  <h3>HSBC Holdings plc board change</h3>
                </a>
                <p class="news-card__date">3 March 2025</p>
              </div>
              <div class="news-card">
                <a href="/news-and-views/news/hsbc-news/2025/short">Short news</a>
              </div>
              <a href="/news-and-views/news">News</a>
              <a href="/news-and-views/news/">See all news</a>
            </div>"#;
        let items = hsbc().extract(&Html::parse_document(html), &source).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].url,
            "https://www.hsbc.com/news-and-views/news/media-releases/2025/hsbc-holdings-plc-board-change"
        );
        assert_eq!(items[0].title, "HSBC Holdings plc board change");
        assert_eq!(items[0].date.as_deref(), Some("3 March 2025"));
    }

    #[test]
    fn test_wells_fargo_table_rows() {
        let source = SourceConfig::new(
            "WellsFargo",
            "Wells Fargo",
            "https://newsroom.wf.com/news-releases/default.aspx",
        );
        let html = r#"
            <table>
              <tr><td class="date">01/15/2025</td><td><a href="/news-releases/news-details/2025/Wells-Fargo-Reports-Fourth-Quarter-2024-Net-Income/default.aspx">Wells Fargo Reports Fourth Quarter 2024 Net Income</a></td></tr>
              <tr><td class="date">01/02/2025</td><td><a href="/news-releases/default.aspx">News releases</a></td></tr>
            </table>"#;
        let items = wells_fargo().extract(&Html::parse_document(html), &source).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].date.as_deref(), Some("01/15/2025"));
    }

    #[test]
    fn test_santander_accepts_banner_then_scrolls() {
        let url = "https://www.santander.co.uk/about-santander/media-centre/press-releases";
        let source = SourceConfig::new("SantanderUK", "Santander UK", url);
        let launcher = FixtureLauncher::new().with_page(
            url,
            r#"<div id="onetrust-banner-sdk"><button id="onetrust-accept-btn-handler">Accept</button></div>
               <a href="/about-santander/media-centre/press-releases/santander-uk-cuts-mortgage-rates">Santander UK cuts mortgage rates</a>"#,
        );
        let mut page = launcher.open(&SessionOptions::default()).unwrap();
        page.navigate(url).unwrap();
        santander_uk().prepare(page.as_mut(), &source);

        let actions = launcher.actions();
        assert!(actions.contains(&"click #onetrust-accept-btn-handler".to_string()));
        assert_eq!(actions.iter().filter(|a| a.starts_with("script ")).count(), 2);
    }

    #[test]
    fn test_ubs_scrolls_three_times() {
        let url = "https://www.ubs.com/global/en/media/global-news.html";
        let source = SourceConfig::new("UBS", "UBS Group", url);
        let launcher = FixtureLauncher::new().with_page(url, "<main></main>");
        let mut page = launcher.open(&SessionOptions::default()).unwrap();
        page.navigate(url).unwrap();
        ubs().prepare(page.as_mut(), &source);
        let scrolls = launcher
            .actions()
            .into_iter()
            .filter(|a| a.starts_with("script "))
            .count();
        assert_eq!(scrolls, 3);
    }
}

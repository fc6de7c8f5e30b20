//! DOM helpers shared by the HTML extractors.
//!
//! Listing pages wrap each story in some kind of card (`article`, `li`, a
//! `div.card`, a table row). The helpers here find that card for a link and
//! read the headline, date and teaser out of it.

use crate::utils::collapse_whitespace;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

pub static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static HEADING: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6, [role='heading']").unwrap());
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());
static DATE_LIKE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[class*='date'], [class*='Date'], .published, .timestamp, .meta").unwrap()
});
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

const CARD_TAGS: [&str; 3] = ["article", "li", "tr"];
const CARD_CLASS_HINTS: [&str; 5] = ["card", "item", "teaser", "result", "tile"];
const CARD_DEPTH: usize = 4;

pub fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Text of the first heading inside `element`.
pub fn heading_within(element: ElementRef<'_>) -> Option<String> {
    element
        .select(&HEADING)
        .map(text_of)
        .find(|t| !t.is_empty())
}

/// `element` itself when it is a link, otherwise its first descendant link.
pub fn first_anchor(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if element.value().name() == "a" && element.value().attr("href").is_some() {
        return Some(element);
    }
    element.select(&ANCHOR).next()
}

/// The story card enclosing `anchor`.
///
/// Only ancestors that hold this one story qualify: no link to another URL
/// and at most one heading. Among those, the nearest card-like element wins
/// (`article`, `li`, `tr` or a card/item/teaser class), else the outermost
/// one, else the anchor itself.
pub fn card_for(anchor: ElementRef<'_>) -> ElementRef<'_> {
    let mut outermost = None;
    for el in anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(CARD_DEPTH)
    {
        if matches!(el.value().name(), "body" | "html") || !wraps_single_story(el, anchor) {
            break;
        }
        if looks_like_card(el) {
            return el;
        }
        outermost = Some(el);
    }
    outermost.unwrap_or(anchor)
}

/// Whether `container` holds no other story than the one `anchor` links to.
pub fn wraps_single_story(container: ElementRef<'_>, anchor: ElementRef<'_>) -> bool {
    let target = link_target(anchor);
    if container.select(&ANCHOR).any(|a| link_target(a) != target) {
        return false;
    }
    container.select(&HEADING).nth(1).is_none()
}

fn link_target<'a>(anchor: ElementRef<'a>) -> &'a str {
    let href = anchor.value().attr("href").unwrap_or_default().trim();
    href.split('#').next().unwrap_or_default()
}

fn looks_like_card(el: ElementRef<'_>) -> bool {
    let value = el.value();
    CARD_TAGS.contains(&value.name())
        || value.classes().any(|class| {
            let class = class.to_ascii_lowercase();
            CARD_CLASS_HINTS.iter().any(|hint| class.contains(hint))
        })
}

/// Headline candidates for a link, best first.
///
/// A heading inside the link, the link's own text, its `title`/`aria-label`,
/// then the card's heading.
pub fn title_candidates(anchor: ElementRef<'_>, card: ElementRef<'_>) -> Vec<String> {
    let mut candidates = Vec::with_capacity(4);
    if let Some(heading) = heading_within(anchor) {
        candidates.push(heading);
    }
    candidates.push(text_of(anchor));
    for attr in ["title", "aria-label"] {
        if let Some(value) = anchor.value().attr(attr) {
            candidates.push(collapse_whitespace(value));
        }
    }
    if card.id() != anchor.id() {
        if let Some(heading) = heading_within(card) {
            candidates.push(heading);
        }
    }
    candidates.retain(|c| !c.is_empty());
    candidates
}

/// Date text inside a card: `<time datetime>`, `<time>` text, or a date-classed element.
pub fn date_within(card: ElementRef<'_>) -> Option<String> {
    if let Some(time) = card.select(&TIME).next() {
        if let Some(datetime) = time.value().attr("datetime") {
            let datetime = datetime.trim();
            if !datetime.is_empty() {
                return Some(datetime.to_string());
            }
        }
        let text = text_of(time);
        if !text.is_empty() {
            return Some(text);
        }
    }
    card.select(&DATE_LIKE)
        .map(text_of)
        .find(|t| !t.is_empty() && t.chars().count() <= 60)
}

/// The first paragraph in a card that reads like a teaser.
pub fn description_within(card: ElementRef<'_>, title: &str) -> Option<String> {
    card.select(&PARAGRAPH)
        .map(text_of)
        .find(|p| p.chars().count() >= 20 && p != title)
}

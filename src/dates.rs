//! Best-effort parsing of the free-text dates found next to news links.
//!
//! Newsrooms print dates in every format imaginable. [`parse_date_from_text`]
//! understands the common ones and returns `None` for everything else; it
//! never panics and never produces an out-of-range date.
//!
//! Numeric dates are read UK-style (`DD/MM/YYYY`). A numeric date is only read
//! US-style when the UK reading is impossible (`12/25/2024`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").unwrap());
static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());
static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})\b").unwrap());
static DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\s+([a-z]{3,9})\.?,?\s+(\d{4})\b").unwrap());
static MONTH_DAY_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})\b").unwrap());
static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b([a-z]{3,9})\s+(\d{4})\b").unwrap());

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Parse a date out of free text.
///
/// Accepts RFC 3339, RFC 2822 (feed `pubDate`), `YYYY-MM-DD`, `DD/MM/YYYY`
/// (also `-` and `.` separators and two-digit years), `21 January 2024`,
/// `January 21, 2024`, abbreviated months, ordinal suffixes (`1st`, `22nd`)
/// and `March 2024` (first of the month). The date may be embedded in other
/// text, e.g. `"Published: 3 March 2025"`.
///
/// Dates without a time are midnight UTC.
pub fn parse_date_from_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&ndt));
    }

    let cleaned = ORDINAL.replace_all(text, "$1");

    if let Some(c) = ISO_DATE.captures(&cleaned) {
        return ymd(num(&c[1])?, num(&c[2])?, num(&c[3])?);
    }

    if let Some(c) = NUMERIC_DATE.captures(&cleaned) {
        let first: u32 = num(&c[1])?;
        let second: u32 = num(&c[2])?;
        let year = expand_year(&c[3])?;
        return ymd(year, second, first).or_else(|| ymd(year, first, second));
    }

    if let Some(c) = DAY_MONTH_YEAR
        .captures_iter(&cleaned)
        .find(|c| month_number(&c[2]).is_some())
    {
        return ymd(num(&c[3])?, month_number(&c[2])?, num(&c[1])?);
    }

    if let Some(c) = MONTH_DAY_YEAR
        .captures_iter(&cleaned)
        .find(|c| month_number(&c[1]).is_some())
    {
        return ymd(num(&c[3])?, month_number(&c[1])?, num(&c[2])?);
    }

    if let Some(c) = MONTH_YEAR
        .captures_iter(&cleaned)
        .find(|c| month_number(&c[1]).is_some())
    {
        return ymd(num(&c[2])?, month_number(&c[1])?, 1);
    }

    None
}

/// Month number for a full or abbreviated English month name.
fn month_number(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    if name == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|m| *m == name || (name.len() == 3 && m.starts_with(&name)))
        .map(|i| i as u32 + 1)
}

fn expand_year(s: &str) -> Option<i32> {
    let y: i32 = num(s)?;
    if s.len() == 2 { Some(2000 + y) } else { Some(y) }
}

fn num<T: std::str::FromStr>(s: &str) -> Option<T> {
    s.parse().ok()
}

fn ymd(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn date(s: &str) -> Option<(i32, u32, u32)> {
        parse_date_from_text(s).map(|d| (d.year(), d.month(), d.day()))
    }

    #[test]
    fn test_iso_passthrough() {
        let d = parse_date_from_text("2024-03-05T14:30:00Z").unwrap();
        assert_eq!(d.to_rfc3339(), "2024-03-05T14:30:00+00:00");
        assert_eq!(date("2024-03-05"), Some((2024, 3, 5)));
    }

    #[test]
    fn test_local_timestamp_with_fraction() {
        let d = parse_date_from_text("2025-02-20T08:00:00.000").unwrap();
        assert_eq!(d.to_rfc3339(), "2025-02-20T08:00:00+00:00");
        let d = parse_date_from_text("2025-02-20T08:00:00").unwrap();
        assert_eq!(d.to_rfc3339(), "2025-02-20T08:00:00+00:00");
    }

    #[test]
    fn test_offset_is_converted_to_utc() {
        let d = parse_date_from_text("2024-03-05T01:00:00+02:00").unwrap();
        assert_eq!(d.to_rfc3339(), "2024-03-04T23:00:00+00:00");
    }

    #[test]
    fn test_numeric_dates_prefer_uk_order() {
        assert_eq!(date("05/03/2024"), Some((2024, 3, 5)));
        assert_eq!(date("25/12/2024"), Some((2024, 12, 25)));
        assert_eq!(date("05.03.24"), Some((2024, 3, 5)));
    }

    #[test]
    fn test_numeric_dates_fall_back_to_us_order_when_uk_is_impossible() {
        assert_eq!(date("12/25/2024"), Some((2024, 12, 25)));
    }

    #[test]
    fn test_ordinal_suffixes_are_stripped() {
        assert_eq!(date("1st January 2024"), Some((2024, 1, 1)));
        assert_eq!(date("January 21st, 2024"), Some((2024, 1, 21)));
        assert_eq!(date("Thursday 22nd Feb 2024"), Some((2024, 2, 22)));
    }

    #[test]
    fn test_named_month_formats() {
        assert_eq!(date("21 January 2024"), Some((2024, 1, 21)));
        assert_eq!(date("Jan 21, 2024"), Some((2024, 1, 21)));
        assert_eq!(date("Sept 3, 2024"), Some((2024, 9, 3)));
        assert_eq!(date("March 2024"), Some((2024, 3, 1)));
    }

    #[test]
    fn test_date_embedded_in_text() {
        assert_eq!(date("Published: 3 March 2025 | 2 min read"), Some((2025, 3, 3)));
    }

    #[test]
    fn test_rfc2822_feed_dates() {
        assert_eq!(date("Tue, 10 Jun 2025 04:00:00 GMT"), Some((2025, 6, 10)));
    }

    #[test]
    fn test_unparseable_text_is_none() {
        assert_eq!(parse_date_from_text("TBD"), None);
        assert_eq!(parse_date_from_text(""), None);
        assert_eq!(parse_date_from_text("   "), None);
        assert_eq!(parse_date_from_text("Press release 42"), None);
    }

    #[test]
    fn test_impossible_dates_are_none() {
        assert_eq!(parse_date_from_text("31/02/2024"), None);
        assert_eq!(parse_date_from_text("2024-13-40"), None);
        assert_eq!(parse_date_from_text("45 Smarch 2024"), None);
    }
}

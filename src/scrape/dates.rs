// src/scrape/dates.rs

//! Heterogeneous date resolution.
//!
//! Sources publish dates as inline text, tag attributes, metadata, or not
//! at all. `find_date` scans free text with ordered shape matchers;
//! `find_date_in_page` walks a whole page through progressively blunter
//! strategies. Both return `None` on failure so the caller can substitute
//! its own default.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{Html, Selector};

/// Date-shape patterns, tried in order. The first shape that matches
/// anywhere in the text gets a chance to parse before later shapes.
fn date_shapes() -> &'static [Regex] {
    static SHAPES: OnceLock<Vec<Regex>> = OnceLock::new();
    SHAPES.get_or_init(|| {
        [
            r"\d{1,2}\s+[A-Za-z]{3,9}\s+\d{4}", // 29 November 2025
            r"\d{1,2}-\d{1,2}-\d{4}",           // 29-11-2025
            r"\d{4}-\d{1,2}-\d{1,2}",           // 2025-11-29
            r"\d{1,2}/\d{1,2}/\d{4}",           // 29/11/2025
            r"[A-Za-z]{3,9}\s+\d{1,2},\s*\d{4}", // November 29, 2025
        ]
        .iter()
        .map(|p| Regex::new(p).expect("date shape patterns are valid"))
        .collect()
    })
}

/// Calendar formats attempted against each shape match, in order.
const DATE_FORMATS: [&str; 7] = [
    "%d %B %Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %b %Y",
];

fn parse_with_formats(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Find the first parseable date-like pattern in a text string.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for shape in date_shapes() {
        if let Some(m) = shape.find(text) {
            if let Some(date) = parse_with_formats(m.as_str()) {
                return Some(date);
            }
        }
    }

    // Last resort: the whole string may itself be a bare date token.
    parse_with_formats(text)
}

/// Extract a publication date from a full HTML page.
///
/// Strategies, in order: a `<time>` element's machine-readable value then
/// its text; standard publish-date meta tags; elements whose class hints
/// at a date; finally the page's entire visible text.
pub fn find_date_in_page(html: &str) -> Option<NaiveDate> {
    let document = Html::parse_document(html);

    // 1) <time datetime="..."> or <time> text
    let time_sel = Selector::parse("time").expect("static selector");
    if let Some(time) = document.select(&time_sel).next() {
        let value = time
            .value()
            .attr("datetime")
            .map(str::to_string)
            .unwrap_or_else(|| element_text(&time));
        if let Some(date) = find_date(&value) {
            return Some(date);
        }
    }

    // 2) publish-date meta tags
    const META_SELECTORS: [&str; 5] = [
        "meta[property='article:published_time']",
        "meta[name='pubdate']",
        "meta[name='publish-date']",
        "meta[name='publish_date']",
        "meta[property='og:published_time']",
    ];
    for sel in META_SELECTORS {
        let selector = Selector::parse(sel).expect("static selector");
        if let Some(meta) = document.select(&selector).next() {
            if let Some(content) = meta.value().attr("content") {
                if let Some(date) = find_date(content) {
                    return Some(date);
                }
            }
        }
    }

    // 3) elements whose class hints at a posted/publish date
    const CLASS_HINTS: [&str; 5] = ["date", "posted", "publish", "time", "meta"];
    let hinted_sel = Selector::parse("span, div, p").expect("static selector");
    for element in document.select(&hinted_sel) {
        let class = element.value().attr("class").unwrap_or("");
        let class_lower = class.to_lowercase();
        if CLASS_HINTS.iter().any(|hint| class_lower.contains(hint)) {
            if let Some(date) = find_date(&element_text(&element)) {
                return Some(date);
            }
        }
    }

    // 4) fallback: first date-like pattern anywhere in the visible text
    let full_text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    find_date(&full_text)
}

/// Collect an element's visible text with whitespace collapsed.
pub fn element_text(element: &scraper::ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 28).unwrap()
    }

    #[test]
    fn supported_literal_formats_agree() {
        for literal in [
            "28/11/2025",
            "28-11-2025",
            "2025-11-28",
            "28 November 2025",
        ] {
            assert_eq!(find_date(literal), Some(expected()), "literal: {literal}");
        }
    }

    #[test]
    fn month_first_and_abbreviated_forms() {
        assert_eq!(find_date("November 28, 2025"), Some(expected()));
        assert_eq!(find_date("Nov 28, 2025"), Some(expected()));
        assert_eq!(find_date("28 Nov 2025"), Some(expected()));
    }

    #[test]
    fn date_embedded_in_surrounding_text() {
        assert_eq!(
            find_date("Posted on 28/11/2025 by the exam cell"),
            Some(expected())
        );
    }

    #[test]
    fn unparseable_text_is_none() {
        assert_eq!(find_date(""), None);
        assert_eq!(find_date("no date here"), None);
        assert_eq!(find_date("99/99/2025"), None);
    }

    #[test]
    fn page_time_element_machine_value_wins() {
        let html = r#"<html><body>
            <time datetime="2025-11-28">yesterday</time>
            <p>Posted 01/01/2020</p>
        </body></html>"#;
        assert_eq!(find_date_in_page(html), Some(expected()));
    }

    #[test]
    fn page_meta_tag() {
        let html = r#"<html><head>
            <meta property="article:published_time" content="2025-11-28T09:00:00" />
        </head><body></body></html>"#;
        assert_eq!(find_date_in_page(html), Some(expected()));
    }

    #[test]
    fn page_class_hinted_element() {
        let html = r#"<html><body>
            <span class="post-date">28 November 2025</span>
        </body></html>"#;
        assert_eq!(find_date_in_page(html), Some(expected()));
    }

    #[test]
    fn page_full_text_fallback() {
        let html = r#"<html><body>
            <div>Circular issued 28-11-2025 regarding exams</div>
        </body></html>"#;
        assert_eq!(find_date_in_page(html), Some(expected()));
    }

    #[test]
    fn page_without_any_date_is_none() {
        let html = "<html><body><p>nothing dated here</p></body></html>";
        assert_eq!(find_date_in_page(html), None);
    }
}

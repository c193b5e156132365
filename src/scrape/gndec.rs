// src/scrape/gndec.rs

//! GNDEC notice extractor.
//!
//! The ERP notice page has changed markup more than once, so extraction
//! runs an ordered chain of structural selectors and takes the first one
//! that matches anything. A fallback pass over all anchors catches pages
//! none of the selectors understand. Dates usually live near the link;
//! when they don't, the item page itself is fetched (politely) and, as a
//! last resort, the candidate is dated today.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{Candidate, GndecConfig, HttpConfig, Source};
use crate::scrape::dates::{self, element_text};
use crate::scrape::NoticeSource;
use crate::utils::http::fetch_text;
use crate::utils::resolve_url;

/// Structural selectors tried in priority order. The first selector
/// yielding any matches wins; later selectors are not tried.
const SELECTOR_CHAIN: [&str; 10] = [
    "table tbody tr td a",
    "div.noticeboard_list a",
    "div.notice a",
    "ul.notice-list a",
    "div.card a",
    "div.page a[href*='/notice/']",
    "a[href*='notice']",
    "a[href*='/notice/']",
    ".post .entry-title a",
    ".widget_recent_entries a",
];

/// Minimum visible text length for the fallback anchor scan.
const FALLBACK_MIN_TITLE_CHARS: usize = 30;

pub struct GndecSource {
    config: GndecConfig,
    per_page_delay: Duration,
    offset: FixedOffset,
}

impl GndecSource {
    pub fn new(config: GndecConfig, http: &HttpConfig, offset: FixedOffset) -> Self {
        Self {
            config,
            per_page_delay: Duration::from_millis(http.per_page_delay_ms),
            offset,
        }
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    /// Probe the notice URL and any configured candidate sub-paths,
    /// settling for the first page that plausibly lists notices.
    async fn find_valid_page(&self, client: &Client) -> Result<(String, String)> {
        let mut urls = vec![self.config.notice_url.clone()];
        for path in &self.config.candidate_paths {
            urls.push(format!(
                "{}/{}",
                self.config.notice_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            ));
        }

        for url in &urls {
            match fetch_text(client, url).await {
                Ok(html) if page_is_plausible(&html) => return Ok((url.clone(), html)),
                Ok(_) => log::debug!("GNDEC probe {url}: page does not look like a notice list"),
                Err(e) => log::debug!("GNDEC probe {url} failed: {e}"),
            }
        }

        // No probe passed; take the notice page as-is.
        let html = fetch_text(client, &self.config.notice_url).await?;
        Ok((self.config.notice_url.clone(), html))
    }
}

#[async_trait]
impl NoticeSource for GndecSource {
    fn tag(&self) -> Source {
        Source::Gndec
    }

    async fn collect(&self, client: &Client) -> Result<Vec<Candidate>> {
        let (page_url, html) = self.find_valid_page(client).await?;
        log::info!("GNDEC: extracting from {page_url}");

        let base = Url::parse(&page_url)?;
        let mut candidates = extract(&html, &base);
        if candidates.is_empty() {
            log::warn!("GNDEC: no candidate notices found; selectors may be stale");
            return Ok(Vec::new());
        }

        // Backfill missing dates from the item pages, one polite fetch at
        // a time; anything still undated gets today's date.
        for candidate in &mut candidates {
            if candidate.date.is_some() {
                continue;
            }
            match fetch_text(client, &candidate.link).await {
                Ok(page) => candidate.date = dates::find_date_in_page(&page),
                Err(e) => log::debug!("GNDEC: date fetch for {} failed: {e}", candidate.link),
            }
            if candidate.date.is_none() {
                candidate.date = Some(self.today());
            }
            tokio::time::sleep(self.per_page_delay).await;
        }

        Ok(candidates)
    }
}

/// Whether a fetched page plausibly carries a notice listing.
pub(crate) fn page_is_plausible(html: &str) -> bool {
    let document = Html::parse_document(html);
    let text = document
        .root_element()
        .text()
        .collect::<String>()
        .to_lowercase();
    if text.contains("notice") {
        return true;
    }
    let anchor_sel = Selector::parse("a").expect("static selector");
    document.select(&anchor_sel).count() > 8
}

/// Run the selector chain over a page, falling back to a heuristic scan
/// of every anchor when no selector matches.
pub(crate) fn extract(html: &str, base: &Url) -> Vec<Candidate> {
    let document = Html::parse_document(html);

    for sel_str in SELECTOR_CHAIN {
        let Ok(selector) = Selector::parse(sel_str) else {
            continue;
        };

        let mut found = Vec::new();
        for anchor in document.select(&selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let title = element_text(&anchor);
            if title.is_empty() {
                continue;
            }
            let Some(link) = resolve_url(base, href) else {
                continue;
            };
            found.push(Candidate {
                title,
                link,
                date: date_near_anchor(&anchor),
            });
        }

        if !found.is_empty() {
            log::debug!("GNDEC: selector matched: {sel_str} ({} found)", found.len());
            return found;
        }
    }

    fallback_scan(&document, base)
}

/// Accept any anchor whose text is long enough or whose target suggests a
/// notice or document.
fn fallback_scan(document: &Html, base: &Url) -> Vec<Candidate> {
    let anchor_sel = Selector::parse("a").expect("static selector");
    let mut found = Vec::new();

    for anchor in document.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let title = element_text(&anchor);
        if title.is_empty() {
            continue;
        }

        let href_lower = href.to_lowercase();
        let looks_like_notice = title.chars().count() > FALLBACK_MIN_TITLE_CHARS
            || href_lower.contains("pdf")
            || href_lower.contains("notice")
            || href_lower.contains("circular");
        if !looks_like_notice {
            continue;
        }

        let Some(link) = resolve_url(base, href) else {
            continue;
        };
        found.push(Candidate {
            title,
            link,
            date: None,
        });
    }

    log::debug!("GNDEC: fallback scan found {} link candidates", found.len());
    found
}

/// Look for a date in sibling-ish elements near the anchor (its parent's
/// first few span/time/small/p descendants).
fn date_near_anchor(anchor: &ElementRef) -> Option<NaiveDate> {
    let parent = anchor.parent().and_then(ElementRef::wrap)?;
    let sel = Selector::parse("span, time, small, p").expect("static selector");
    parent
        .select(&sel)
        .take(4)
        .find_map(|el| dates::find_date(&element_text(&el)))
}

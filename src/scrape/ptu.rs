// src/scrape/ptu.rs

//! PTU noticeboard extractor.
//!
//! The noticeboard is one big table. Per row, the cell containing a
//! parseable date is taken as the date cell, and the longest remaining
//! text cell is assumed to be the title. That widest-cell assumption is a
//! documented heuristic, not a guarantee; keep it as-is.
//!
//! PTU requires a confirmed date: undated rows are skipped rather than
//! defaulted, and anything older than the retention window is discarded
//! before it ever reaches the store.

use async_trait::async_trait;
use chrono::{Days, FixedOffset, NaiveDate, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{Candidate, PtuConfig, Source};
use crate::scrape::dates::{self, element_text};
use crate::scrape::NoticeSource;
use crate::utils::http::fetch_text;
use crate::utils::resolve_url;

pub struct PtuSource {
    config: PtuConfig,
    offset: FixedOffset,
}

impl PtuSource {
    pub fn new(config: PtuConfig, offset: FixedOffset) -> Self {
        Self { config, offset }
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}

#[async_trait]
impl NoticeSource for PtuSource {
    fn tag(&self) -> Source {
        Source::Ptu
    }

    async fn collect(&self, client: &Client) -> Result<Vec<Candidate>> {
        let html = fetch_text(client, &self.config.notice_url).await?;
        let base = Url::parse(&self.config.base_url)?;

        let rows = extract_rows(&html, &base, self.config.max_rows);
        if rows.is_empty() {
            log::warn!("PTU: no usable rows on noticeboard page");
            return Ok(Vec::new());
        }

        let today = self.today();
        let mut kept = Vec::new();
        for candidate in rows {
            let Some(date) = candidate.date else {
                log::debug!("PTU: skipping undated row: {}", candidate.title);
                continue;
            };
            if !within_retention(date, today, self.config.retention_days) {
                log::debug!(
                    "PTU: skipping {} ({date} older than {} days)",
                    candidate.title,
                    self.config.retention_days
                );
                continue;
            }
            kept.push(candidate);
        }
        Ok(kept)
    }
}

/// Whether a candidate date falls inside the retention window. The
/// boundary date (today minus the window) is retained.
pub(crate) fn within_retention(date: NaiveDate, today: NaiveDate, retention_days: i64) -> bool {
    let limit = today
        .checked_sub_days(Days::new(retention_days.max(0) as u64))
        .unwrap_or(NaiveDate::MIN);
    date >= limit
}

/// Parse the first table on the page into row candidates, skipping the
/// header row and scanning at most `max_rows` data rows.
pub(crate) fn extract_rows(html: &str, base: &Url, max_rows: usize) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table").expect("static selector");
    let Some(table) = document.select(&table_sel).next() else {
        log::warn!("PTU: no table found on page");
        return Vec::new();
    };

    let row_sel = Selector::parse("tr").expect("static selector");
    table
        .select(&row_sel)
        .skip(1)
        .take(max_rows)
        .filter_map(|row| parse_row(&row, base))
        .collect()
}

/// Pick title, link, and date out of one table row.
fn parse_row(row: &ElementRef, base: &Url) -> Option<Candidate> {
    let cell_sel = Selector::parse("td").expect("static selector");
    let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
    if cells.is_empty() {
        return None;
    }

    // The first cell with a parseable date is the date cell.
    let date_idx = cells
        .iter()
        .position(|td| dates::find_date(&element_text(td)).is_some());

    // Longest remaining cell is assumed to be the title; ties keep the
    // first occurrence.
    let mut title_cell: Option<&ElementRef> = None;
    let mut max_len = 0;
    for (i, td) in cells.iter().enumerate() {
        if Some(i) == date_idx {
            continue;
        }
        let len = element_text(td).chars().count();
        if len > max_len {
            max_len = len;
            title_cell = Some(td);
        }
    }
    let title = element_text(title_cell?);
    if title.is_empty() {
        return None;
    }

    // Prefer an anchor inside the title cell, then any row anchor that
    // looks like a notice or document, then the first anchor at all.
    let anchor_sel = Selector::parse("a").expect("static selector");
    let mut href = title_cell
        .and_then(|td| td.select(&anchor_sel).next())
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    if href.is_none() {
        let anchors: Vec<&str> = row
            .select(&anchor_sel)
            .filter_map(|a| a.value().attr("href"))
            .collect();
        href = anchors
            .iter()
            .find(|h| {
                let low = h.to_lowercase();
                low.contains("notice") || low.ends_with(".pdf") || h.starts_with("http")
            })
            .or(anchors.first())
            .map(|s| s.to_string());
    }
    let link = resolve_url(base, &href?)?;

    // Date from the date cell, else the first date found in any cell.
    let date = date_idx
        .and_then(|i| dates::find_date(&element_text(&cells[i])))
        .or_else(|| {
            cells
                .iter()
                .find_map(|td| dates::find_date(&element_text(td)))
        });

    Some(Candidate { title, link, date })
}

// src/scrape/mod.rs

//! Per-source notice extraction.
//!
//! Each source implements [`NoticeSource`]: fetch its pages, apply its
//! structural heuristics, and hand back candidate notices with dates
//! already resolved according to that source's own policy. The policies
//! deliberately differ: PTU demands a confirmed date and applies a
//! retention window, GNDEC backfills from the item page and falls back
//! to today. Do not unify them.

pub mod dates;
pub mod gndec;
pub mod ptu;

use async_trait::async_trait;
use chrono::FixedOffset;
use reqwest::Client;

use crate::error::Result;
use crate::models::{Candidate, Config, Source};

pub use gndec::GndecSource;
pub use ptu::PtuSource;

/// A pluggable notice source.
#[async_trait]
pub trait NoticeSource: Send + Sync {
    /// Origin tag stamped on everything this source produces.
    fn tag(&self) -> Source;

    /// Fetch and extract the current batch of candidates.
    ///
    /// Every call re-fetches and re-parses; the batch is final for this
    /// cycle. Extraction is best-effort: an unusable page yields an empty
    /// batch, a failed fetch an error the caller logs and skips.
    async fn collect(&self, client: &Client) -> Result<Vec<Candidate>>;
}

/// Construct every configured source, in the order they are scraped.
pub fn all_sources(config: &Config, offset: FixedOffset) -> Vec<Box<dyn NoticeSource>> {
    vec![
        Box::new(PtuSource::new(config.sources.ptu.clone(), offset)),
        Box::new(GndecSource::new(
            config.sources.gndec.clone(),
            &config.http,
            offset,
        )),
    ]
}

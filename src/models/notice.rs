// src/models/notice.rs

//! Notice data structures.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// External origin a notice was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Ptu,
    Gndec,
}

impl Source {
    /// Canonical uppercase tag, as stored and matched against alerts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Ptu => "PTU",
            Source::Gndec => "GNDEC",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PTU" => Ok(Source::Ptu),
            "GNDEC" => Ok(Source::Gndec),
            other => Err(AppError::config(format!("unknown source tag: {other}"))),
        }
    }
}

/// A stored notice with its assigned identity.
///
/// Never mutated after insertion; uniqueness holds on both `link` and
/// `title` (first write wins).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    /// Identity assigned by the store on first persist
    pub id: i64,

    /// Notice title
    pub title: String,

    /// Full URL to the notice or attached document
    pub link: String,

    /// Posting date
    pub date: NaiveDate,

    /// Origin tag
    pub source: Source,
}

impl Notice {
    /// Message body for an immediate alert.
    pub fn alert_text(&self) -> String {
        format!(
            "📢 New [{}] Notice:\n{}\n{}\n🗓 {}",
            self.source, self.title, self.link, self.date
        )
    }

    /// One entry line inside a daily digest message.
    pub fn digest_line(&self) -> String {
        format!("- {}\n{}\n🗓 {}\n", self.title, self.link, self.date)
    }
}

/// A candidate notice produced by an extractor, before persistence.
///
/// `date` is `None` when the listing carried no usable date hint; each
/// source decides whether to backfill, default, or skip such candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    pub date: Option<NaiveDate>,
}

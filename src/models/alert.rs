// src/models/alert.rs

//! Alert subscriptions and the matching predicate.
//!
//! Alerts are created and destroyed by the subscription-management
//! surface; this core only reads them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Notice;

/// Delivery channel tag. Dispatch is by variant, not inheritance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Whatsapp,
    Telegram,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Whatsapp => "whatsapp",
            Channel::Telegram => "telegram",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "whatsapp" => Ok(Channel::Whatsapp),
            "telegram" => Ok(Channel::Telegram),
            other => Err(AppError::config(format!("unknown channel: {other}"))),
        }
    }
}

/// How often an alert is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    /// Delivered synchronously upon a notice's first persistence
    Immediate,
    /// Batched into a once-per-day digest
    Daily,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Immediate => "immediate",
            Frequency::Daily => "daily",
        }
    }
}

impl FromStr for Frequency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "immediate" => Ok(Frequency::Immediate),
            "daily" => Ok(Frequency::Daily),
            other => Err(AppError::config(format!("unknown frequency: {other}"))),
        }
    }
}

/// A user subscription matching notices by optional source and keyword.
///
/// `keyword` and `source` are each either `None` (matches anything) or a
/// non-empty constraint; the store normalizes empty strings on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: i64,

    /// Opaque recipient identifier in channel-specific format
    /// (Telegram chat id, or `whatsapp:+91...` for Twilio)
    pub user_identifier: String,

    pub channel: Channel,
    pub keyword: Option<String>,
    pub source: Option<String>,
    pub frequency: Frequency,
    pub active: bool,
}

impl Alert {
    /// Pure matching predicate.
    ///
    /// Source filter: absent, or equal to the notice source
    /// (case-insensitive). Keyword filter: absent, or a case-insensitive
    /// substring of the title. No tokenization, no stemming.
    pub fn matches(&self, notice: &Notice) -> bool {
        if let Some(source) = &self.source {
            if !source.eq_ignore_ascii_case(notice.source.as_str()) {
                return false;
            }
        }

        if let Some(keyword) = &self.keyword {
            if !notice
                .title
                .to_lowercase()
                .contains(&keyword.to_lowercase())
            {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::Source;

    fn alert(source: Option<&str>, keyword: Option<&str>) -> Alert {
        Alert {
            id: 1,
            user_identifier: "12345".to_string(),
            channel: Channel::Telegram,
            keyword: keyword.map(str::to_string),
            source: source.map(str::to_string),
            frequency: Frequency::Immediate,
            active: true,
        }
    }

    fn notice(source: Source, title: &str) -> Notice {
        Notice {
            id: 1,
            title: title.to_string(),
            link: "https://example.com/n/1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 11, 28).unwrap(),
            source,
        }
    }

    #[test]
    fn matches_source_and_keyword() {
        let a = alert(Some("PTU"), Some("exam"));
        assert!(a.matches(&notice(Source::Ptu, "Mid-term Exam Schedule")));
    }

    #[test]
    fn rejects_wrong_source() {
        let a = alert(Some("PTU"), Some("exam"));
        assert!(!a.matches(&notice(Source::Gndec, "Exam Schedule")));
    }

    #[test]
    fn rejects_missing_keyword() {
        let a = alert(Some("PTU"), Some("exam"));
        assert!(!a.matches(&notice(Source::Ptu, "Holiday List 2025")));
    }

    #[test]
    fn unconstrained_alert_matches_anything() {
        let a = alert(None, None);
        assert!(a.matches(&notice(Source::Ptu, "Anything at all")));
        assert!(a.matches(&notice(Source::Gndec, "")));
    }

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        let a = alert(None, Some("ADMIT"));
        assert!(a.matches(&notice(Source::Gndec, "Admit Card Released")));
        assert!(!a.matches(&notice(Source::Gndec, "Ad mit card")));
    }

    #[test]
    fn source_filter_is_case_insensitive() {
        let a = alert(Some("ptu"), None);
        assert!(a.matches(&notice(Source::Ptu, "x")));
    }
}

// src/error.rs

//! Unified error handling for the alert pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database operation failed
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extraction error (page fetched but no usable notices)
    #[error("Extraction error for {source_name}: {message}")]
    Extract {
        source_name: String,
        message: String,
    },

    /// Message delivery failed
    #[error("Delivery error on {channel}: {message}")]
    Delivery { channel: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an extraction error tagged with its source.
    pub fn extract(source: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Extract {
            source_name: source.into(),
            message: message.to_string(),
        }
    }

    /// Create a delivery error tagged with its channel.
    pub fn delivery(channel: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Delivery {
            channel: channel.into(),
            message: message.to_string(),
        }
    }

    /// Whether the failure is worth retrying on the next scheduled cycle.
    ///
    /// Transient failures (network, store) resolve themselves; permanent
    /// ones (bad selector, unusable page) will fail identically next time,
    /// so callers skip the item instead.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Db(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let db = AppError::Db(rusqlite::Error::InvalidQuery);
        assert!(db.is_transient());

        let sel = AppError::selector("[[bad", "parse failure");
        assert!(!sel.is_transient());

        let ext = AppError::extract("PTU", "no table on page");
        assert!(!ext.is_transient());
    }
}

// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Per-source extraction settings
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Scheduler timing
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Delivery channel credential lookup
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// SQLite database path
    #[serde(default = "defaults::database_path")]
    pub database_path: String,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::config("http.timeout_secs must be > 0"));
        }
        if self.schedule.scrape_interval_minutes == 0 {
            return Err(AppError::config(
                "schedule.scrape_interval_minutes must be > 0",
            ));
        }
        if self.schedule.digest_hour > 23 {
            return Err(AppError::config("schedule.digest_hour must be 0-23"));
        }
        if self.schedule.digest_minute > 59 {
            return Err(AppError::config("schedule.digest_minute must be 0-59"));
        }
        if self.schedule.utc_offset_minutes.abs() > 14 * 60 {
            return Err(AppError::config("schedule.utc_offset_minutes out of range"));
        }
        if self.sources.ptu.max_rows == 0 {
            return Err(AppError::config("sources.ptu.max_rows must be > 0"));
        }
        if self.sources.ptu.retention_days == 0 {
            return Err(AppError::config("sources.ptu.retention_days must be > 0"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            sources: SourcesConfig::default(),
            schedule: ScheduleConfig::default(),
            channels: ChannelsConfig::default(),
            database_path: defaults::database_path(),
        }
    }
}

/// HTTP client settings, shared by all sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between secondary per-item page fetches, in milliseconds
    #[serde(default = "defaults::per_page_delay")]
    pub per_page_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            per_page_delay_ms: defaults::per_page_delay(),
        }
    }
}

/// Per-source extraction settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub ptu: PtuConfig,

    #[serde(default)]
    pub gndec: GndecConfig,
}

/// PTU noticeboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtuConfig {
    /// Base URL for resolving relative links
    #[serde(default = "defaults::ptu_base_url")]
    pub base_url: String,

    /// Noticeboard page URL
    #[serde(default = "defaults::ptu_notice_url")]
    pub notice_url: String,

    /// Number of table rows to scan from the top
    #[serde(default = "defaults::ptu_max_rows")]
    pub max_rows: usize,

    /// Candidates dated older than this many days are discarded
    #[serde(default = "defaults::ptu_retention_days")]
    pub retention_days: i64,
}

impl Default for PtuConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::ptu_base_url(),
            notice_url: defaults::ptu_notice_url(),
            max_rows: defaults::ptu_max_rows(),
            retention_days: defaults::ptu_retention_days(),
        }
    }
}

/// GNDEC notice page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GndecConfig {
    /// Notice page URL
    #[serde(default = "defaults::gndec_url")]
    pub notice_url: String,

    /// Candidate sub-paths probed before falling back to the notice URL
    #[serde(default)]
    pub candidate_paths: Vec<String>,
}

impl Default for GndecConfig {
    fn default() -> Self {
        Self {
            notice_url: defaults::gndec_url(),
            candidate_paths: Vec::new(),
        }
    }
}

/// Scheduler timing, in one fixed local offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Minutes between extraction cycles
    #[serde(default = "defaults::scrape_interval")]
    pub scrape_interval_minutes: u64,

    /// Local hour of the daily digest (24-hour clock)
    #[serde(default = "defaults::digest_hour")]
    pub digest_hour: u32,

    /// Local minute of the daily digest
    #[serde(default)]
    pub digest_minute: u32,

    /// Fixed offset from UTC, in minutes (default +05:30)
    #[serde(default = "defaults::utc_offset")]
    pub utc_offset_minutes: i32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            scrape_interval_minutes: defaults::scrape_interval(),
            digest_hour: defaults::digest_hour(),
            digest_minute: 0,
            utc_offset_minutes: defaults::utc_offset(),
        }
    }
}

/// Environment variable names holding channel credentials.
///
/// Only the variable names live in config; the secrets themselves stay in
/// the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default = "defaults::telegram_token_env")]
    pub telegram_token_env: String,

    #[serde(default = "defaults::twilio_sid_env")]
    pub twilio_sid_env: String,

    #[serde(default = "defaults::twilio_token_env")]
    pub twilio_token_env: String,

    #[serde(default = "defaults::twilio_whatsapp_from_env")]
    pub twilio_whatsapp_from_env: String,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            telegram_token_env: defaults::telegram_token_env(),
            twilio_sid_env: defaults::twilio_sid_env(),
            twilio_token_env: defaults::twilio_token_env(),
            twilio_whatsapp_from_env: defaults::twilio_whatsapp_from_env(),
        }
    }
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; campus-alerts/1.0)".into()
    }
    pub fn timeout() -> u64 {
        12
    }
    pub fn per_page_delay() -> u64 {
        400
    }

    // Source defaults
    pub fn ptu_base_url() -> String {
        "https://ptu.ac.in".into()
    }
    pub fn ptu_notice_url() -> String {
        "https://ptu.ac.in/noticeboard-main/".into()
    }
    pub fn ptu_max_rows() -> usize {
        100
    }
    pub fn ptu_retention_days() -> i64 {
        30
    }
    pub fn gndec_url() -> String {
        "https://erp.gndec.ac.in/notice".into()
    }

    // Schedule defaults
    pub fn scrape_interval() -> u64 {
        30
    }
    pub fn digest_hour() -> u32 {
        18
    }
    pub fn utc_offset() -> i32 {
        330
    }

    // Channel credential env var names
    pub fn telegram_token_env() -> String {
        "TELEGRAM_TOKEN".into()
    }
    pub fn twilio_sid_env() -> String {
        "TWILIO_ACCOUNT_SID".into()
    }
    pub fn twilio_token_env() -> String {
        "TWILIO_AUTH_TOKEN".into()
    }
    pub fn twilio_whatsapp_from_env() -> String {
        "TWILIO_WHATSAPP_NUMBER".into()
    }

    // Storage defaults
    pub fn database_path() -> String {
        "data/alerts.db".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_digest_hour() {
        let mut config = Config::default();
        config.schedule.digest_hour = 24;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_retention() {
        let mut config = Config::default();
        config.sources.ptu.retention_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [schedule]
            scrape_interval_minutes = 15

            [sources.ptu]
            retention_days = 14
            "#,
        )
        .unwrap();
        assert_eq!(config.schedule.scrape_interval_minutes, 15);
        assert_eq!(config.sources.ptu.retention_days, 14);
        assert_eq!(config.schedule.digest_hour, 18);
        assert_eq!(config.http.timeout_secs, 12);
        assert_eq!(config.database_path, "data/alerts.db");
    }
}

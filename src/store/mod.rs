// src/store/mod.rs

//! SQLite-backed persistence: notices, alerts, and the sent-ledger.
//!
//! The store is the single writer in the common case (one scheduling
//! worker), but the sent-ledger tolerates duplicate writes from
//! cross-process overlap via its composite primary key.

use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::NaiveDate;
use rusqlite::{Connection, Row, params};

use crate::error::Result;
use crate::models::{Alert, Channel, Frequency, Notice, Source};

/// Outcome of an insert-if-new attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Freshly persisted, with its assigned identity
    Inserted(Notice),
    /// A notice with the same link or title already exists; nothing written
    Duplicate,
}

/// Database handle. All access is synchronous and per-call; no
/// transaction spans the matching loop.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS notices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                link TEXT NOT NULL UNIQUE,
                date TEXT NOT NULL,
                source TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_notices_date ON notices(date)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_identifier TEXT NOT NULL,
                channel TEXT NOT NULL,
                keyword TEXT,
                source TEXT,
                frequency TEXT NOT NULL DEFAULT 'immediate',
                active INTEGER NOT NULL DEFAULT 1
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS alerts_sent (
                alert_id INTEGER NOT NULL,
                notice_id INTEGER NOT NULL,
                PRIMARY KEY (alert_id, notice_id)
            )",
            [],
        )?;

        Ok(())
    }

    // ---- Notices ----

    /// Insert a notice unless one with the same link or title exists.
    ///
    /// A single `INSERT OR IGNORE` both checks and writes, so the
    /// assigned identity comes back without a re-select.
    pub fn insert_if_new(
        &self,
        title: &str,
        link: &str,
        date: NaiveDate,
        source: Source,
    ) -> Result<InsertOutcome> {
        let conn = self.conn.lock().unwrap();

        let changed = conn.execute(
            "INSERT OR IGNORE INTO notices (title, link, date, source)
             VALUES (?1, ?2, ?3, ?4)",
            params![title, link, date.to_string(), source.as_str()],
        )?;

        if changed == 0 {
            return Ok(InsertOutcome::Duplicate);
        }

        Ok(InsertOutcome::Inserted(Notice {
            id: conn.last_insert_rowid(),
            title: title.to_string(),
            link: link.to_string(),
            date,
            source,
        }))
    }

    /// Notices dated on or after `since`, newest first.
    pub fn recent_notices(&self, since: NaiveDate) -> Result<Vec<Notice>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, link, date, source FROM notices
             WHERE date >= ?1 ORDER BY date DESC",
        )?;

        let rows = stmt.query_map(params![since.to_string()], notice_from_row)?;
        let mut notices = Vec::new();
        for row in rows {
            notices.push(row?);
        }
        Ok(notices)
    }

    // ---- Alerts (read-only to this core) ----

    /// Active alerts, optionally restricted to one frequency.
    pub fn active_alerts(&self, frequency: Option<Frequency>) -> Result<Vec<Alert>> {
        let conn = self.conn.lock().unwrap();

        let mut alerts = Vec::new();
        match frequency {
            Some(freq) => {
                let mut stmt = conn.prepare(
                    "SELECT id, user_identifier, channel, keyword, source, frequency, active
                     FROM alerts WHERE active = 1 AND frequency = ?1",
                )?;
                let rows = stmt.query_map(params![freq.as_str()], alert_from_row)?;
                for row in rows {
                    alerts.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, user_identifier, channel, keyword, source, frequency, active
                     FROM alerts WHERE active = 1",
                )?;
                let rows = stmt.query_map([], alert_from_row)?;
                for row in rows {
                    alerts.push(row?);
                }
            }
        }
        Ok(alerts)
    }

    /// Seed an alert row. The subscription surface owns alert lifecycle;
    /// this exists for that surface and for tests.
    pub fn insert_alert(&self, alert: &Alert) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO alerts (user_identifier, channel, keyword, source, frequency, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                alert.user_identifier,
                alert.channel.as_str(),
                alert.keyword,
                alert.source,
                alert.frequency.as_str(),
                alert.active as i64,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    // ---- Sent-ledger ----

    /// Whether this (alert, notice) pair was already delivered.
    pub fn already_sent(&self, alert_id: i64, notice_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT 1 FROM alerts_sent WHERE alert_id = ?1 AND notice_id = ?2")?;
        Ok(stmt.exists(params![alert_id, notice_id])?)
    }

    /// Record a confirmed delivery. Duplicate writes (races between the
    /// immediate and daily passes) are silently ignored; the primary key
    /// keeps the ledger at one record per pair.
    pub fn mark_sent(&self, alert_id: i64, notice_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO alerts_sent (alert_id, notice_id) VALUES (?1, ?2)",
            params![alert_id, notice_id],
        )?;
        Ok(())
    }

    #[cfg(test)]
    fn count(&self, table: &str) -> i64 {
        let conn = self.conn.lock().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }
}

fn notice_from_row(row: &Row<'_>) -> rusqlite::Result<Notice> {
    let date_text: String = row.get(3)?;
    let source_text: String = row.get(4)?;
    Ok(Notice {
        id: row.get(0)?,
        title: row.get(1)?,
        link: row.get(2)?,
        date: NaiveDate::parse_from_str(&date_text, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        source: Source::from_str(&source_text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}

fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    let channel_text: String = row.get(2)?;
    let frequency_text: String = row.get(5)?;
    let active: i64 = row.get(6)?;
    Ok(Alert {
        id: row.get(0)?,
        user_identifier: row.get(1)?,
        channel: Channel::from_str(&channel_text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        keyword: non_empty(row.get(3)?),
        source: non_empty(row.get(4)?),
        frequency: Frequency::from_str(&frequency_text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?,
        active: active != 0,
    })
}

/// Empty-string constraints are treated as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

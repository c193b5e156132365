// src/lib.rs

//! Campus notice ingestion and alert fanout library.
//!
//! Periodically pulls announcement pages from external sources, extracts
//! canonical notice records, deduplicates them, matches them against user
//! subscriptions, and delivers matches over messaging channels.

pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod scheduler;
pub mod scrape;
pub mod store;
pub mod utils;

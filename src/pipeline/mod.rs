// src/pipeline/mod.rs

//! Pipeline entry points.
//!
//! - `run_all_sources`: one extraction cycle across every source
//! - `run_daily_digest`: the once-daily aggregation pass

pub mod digest;
pub mod ingest;

pub use digest::run_daily_digest;
pub use ingest::{run_all_sources, run_source};

// src/models/mod.rs

//! Domain models for the alert pipeline.

mod alert;
mod config;
mod notice;

pub use alert::{Alert, Channel, Frequency};
pub use config::{
    ChannelsConfig, Config, GndecConfig, HttpConfig, PtuConfig, ScheduleConfig, SourcesConfig,
};
pub use notice::{Candidate, Notice, Source};

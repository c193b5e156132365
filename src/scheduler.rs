// src/scheduler.rs

//! Single-worker job scheduler.
//!
//! Two jobs share one worker: the periodic extraction cycle and the
//! once-daily digest. Each job runs to completion before the next due job
//! fires, so jobs never overlap in-process. All clock math happens in one
//! fixed local offset.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveTime, TimeZone, Utc};
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::ScheduleConfig;
use crate::notify::Router;
use crate::pipeline::{digest, ingest};
use crate::scrape::NoticeSource;
use crate::store::Database;

/// Build the scheduler's fixed offset from config.
pub fn fixed_offset(schedule: &ScheduleConfig) -> Result<FixedOffset> {
    FixedOffset::east_opt(schedule.utc_offset_minutes * 60)
        .ok_or_else(|| AppError::config("schedule.utc_offset_minutes is not a valid offset"))
}

fn now_local(offset: &FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(offset)
}

/// Next occurrence of the daily digest time strictly after `now`.
fn next_digest_after(
    now: DateTime<FixedOffset>,
    hour: u32,
    minute: u32,
) -> DateTime<FixedOffset> {
    let fire_time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let today_fire = now.date_naive().and_time(fire_time);
    let candidate = match now.timezone().from_local_datetime(&today_fire) {
        LocalResult::Single(dt) => dt,
        // fixed offsets map every local time uniquely
        _ => now,
    };
    if candidate > now {
        candidate
    } else {
        candidate + Duration::days(1)
    }
}

/// Drive both jobs forever. Never returns except on a config error.
pub async fn run(
    db: &Database,
    router: &Router,
    sources: &[Box<dyn NoticeSource>],
    client: &Client,
    schedule: &ScheduleConfig,
) -> Result<()> {
    let offset = fixed_offset(schedule)?;
    let interval = Duration::minutes(schedule.scrape_interval_minutes as i64);

    // Immediate smoke pass before entering the loop.
    log::info!("scheduler: running scrapers once at startup");
    ingest::run_all_sources(db, router, sources, client).await;

    let mut next_scrape = now_local(&offset) + interval;
    let mut next_digest =
        next_digest_after(now_local(&offset), schedule.digest_hour, schedule.digest_minute);

    log::info!(
        "scheduler: scraping every {} minutes, digest daily at {:02}:{:02} (UTC{})",
        schedule.scrape_interval_minutes,
        schedule.digest_hour,
        schedule.digest_minute,
        offset
    );

    loop {
        let now = now_local(&offset);
        let wake = next_scrape.min(next_digest);
        if wake > now {
            let pause = (wake - now).to_std().unwrap_or(StdDuration::ZERO);
            tokio::time::sleep(pause).await;
        }

        if now_local(&offset) >= next_scrape {
            ingest::run_all_sources(db, router, sources, client).await;
            // next fire measured from completion, so cycles never pile up
            next_scrape = now_local(&offset) + interval;
        }

        if now_local(&offset) >= next_digest {
            let today = now_local(&offset).date_naive();
            if let Err(e) = digest::run_daily_digest(db, router, today).await {
                log::error!("daily digest failed: {e}");
            }
            next_digest = next_digest_after(
                now_local(&offset),
                schedule.digest_hour,
                schedule.digest_minute,
            );
        }
    }
}

// src/pipeline/ingest.rs

//! Extraction cycle: collect candidates per source, dedupe into the
//! store, and fan out fresh notices to immediate alerts.

use reqwest::Client;

use crate::error::Result;
use crate::notify::{self, Router};
use crate::scrape::NoticeSource;
use crate::store::{Database, InsertOutcome};

/// Summary of one source's run.
#[derive(Debug, Default)]
pub struct IngestStats {
    pub candidates: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

/// Run one source to completion: fetch, extract, insert, notify.
///
/// A store failure aborts only the current item; the batch continues.
pub async fn run_source(
    db: &Database,
    router: &Router,
    source: &dyn NoticeSource,
    client: &Client,
) -> Result<IngestStats> {
    let tag = source.tag();
    log::info!("{tag}: extraction starting");

    let candidates = source.collect(client).await?;
    let mut stats = IngestStats {
        candidates: candidates.len(),
        ..IngestStats::default()
    };

    for candidate in candidates {
        // Sources resolve or drop undated candidates before this point.
        let Some(date) = candidate.date else {
            stats.skipped += 1;
            continue;
        };

        match db.insert_if_new(&candidate.title, &candidate.link, date, tag) {
            Ok(InsertOutcome::Inserted(fresh)) => {
                stats.inserted += 1;
                notify::notify_if_matches(db, router, &fresh).await;
            }
            Ok(InsertOutcome::Duplicate) => stats.duplicates += 1,
            Err(e) => {
                stats.skipped += 1;
                log::warn!("{tag}: store failure for {}, item skipped: {e}", candidate.link);
            }
        }
    }

    log::info!(
        "{tag}: {} candidates, {} inserted, {} duplicates, {} skipped",
        stats.candidates,
        stats.inserted,
        stats.duplicates,
        stats.skipped
    );
    Ok(stats)
}

/// Run every source sequentially. One source failing never prevents the
/// next from running; load on the sites stays bounded.
pub async fn run_all_sources(
    db: &Database,
    router: &Router,
    sources: &[Box<dyn NoticeSource>],
    client: &Client,
) {
    for source in sources {
        if let Err(e) = run_source(db, router, source.as_ref(), client).await {
            let kind = if e.is_transient() {
                "transient, will retry next cycle"
            } else {
                "permanent"
            };
            log::error!("{}: source run failed ({kind}): {e}", source.tag());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::error::Result;
    use crate::models::{Alert, Candidate, Channel, Frequency, Source};
    use crate::notify::testing::RecordingSender;
    use crate::notify::ChannelSender;

    struct FixedSource {
        tag: Source,
        batch: Vec<Candidate>,
    }

    #[async_trait]
    impl NoticeSource for FixedSource {
        fn tag(&self) -> Source {
            self.tag
        }

        async fn collect(&self, _client: &Client) -> Result<Vec<Candidate>> {
            Ok(self.batch.clone())
        }
    }

    struct Shared(Arc<RecordingSender>);

    #[async_trait]
    impl ChannelSender for Shared {
        async fn send(&self, recipient: &str, text: &str) -> Result<()> {
            self.0.send(recipient, text).await
        }
    }

    fn router_with(telegram: &Arc<RecordingSender>) -> Router {
        Router::new(
            Box::new(Shared(Arc::new(RecordingSender::default()))),
            Box::new(Shared(Arc::clone(telegram))),
        )
    }

    #[tokio::test]
    async fn end_to_end_immediate_delivery() {
        let db = Database::open_in_memory().unwrap();
        let telegram = Arc::new(RecordingSender::default());
        let router = router_with(&telegram);

        let alert_id = db
            .insert_alert(&Alert {
                id: 0,
                user_identifier: "chat-42".into(),
                channel: Channel::Telegram,
                keyword: Some("admit".into()),
                source: None,
                frequency: Frequency::Immediate,
                active: true,
            })
            .unwrap();

        let source = FixedSource {
            tag: Source::Gndec,
            batch: vec![Candidate {
                title: "Admit Card Released".into(),
                link: "https://x/1".into(),
                date: Some(Utc::now().date_naive()),
            }],
        };

        let client = Client::new();
        let stats = run_source(&db, &router, &source, &client).await.unwrap();
        assert_eq!(stats.inserted, 1);

        let calls = telegram.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "chat-42");
        assert!(calls[0].1.contains("Admit Card Released"));

        let stored = db
            .recent_notices(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert!(db.already_sent(alert_id, stored[0].id).unwrap());
    }

    #[tokio::test]
    async fn second_cycle_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let telegram = Arc::new(RecordingSender::default());
        let router = router_with(&telegram);

        db.insert_alert(&Alert {
            id: 0,
            user_identifier: "chat-1".into(),
            channel: Channel::Telegram,
            keyword: None,
            source: None,
            frequency: Frequency::Immediate,
            active: true,
        })
        .unwrap();

        let source = FixedSource {
            tag: Source::Ptu,
            batch: vec![Candidate {
                title: "Fee Notice".into(),
                link: "https://x/fee".into(),
                date: Some(Utc::now().date_naive()),
            }],
        };

        let client = Client::new();
        let first = run_source(&db, &router, &source, &client).await.unwrap();
        let second = run_source(&db, &router, &source, &client).await.unwrap();

        assert_eq!(first.inserted, 1);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 1);
        // duplicate insert triggers no second notification
        assert_eq!(telegram.calls().len(), 1);
    }

    #[tokio::test]
    async fn undated_candidates_are_skipped() {
        let db = Database::open_in_memory().unwrap();
        let telegram = Arc::new(RecordingSender::default());
        let router = router_with(&telegram);

        let source = FixedSource {
            tag: Source::Ptu,
            batch: vec![Candidate {
                title: "No date".into(),
                link: "https://x/nd".into(),
                date: None,
            }],
        };

        let client = Client::new();
        let stats = run_source(&db, &router, &source, &client).await.unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.inserted, 0);
    }
}

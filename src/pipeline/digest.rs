// src/pipeline/digest.rs

//! Daily digest pass: one aggregated message per daily alert covering the
//! last 24 hours of matching, not-yet-sent notices. Alerts with nothing
//! new receive nothing.

use chrono::{Days, NaiveDate};

use crate::error::Result;
use crate::models::{Alert, Frequency, Notice};
use crate::notify::Router;
use crate::store::Database;

/// Render the aggregated digest body for one alert.
fn digest_text(matched: &[&Notice]) -> String {
    let mut text = String::from("📬 Daily Digest: matching notices\n\n");
    for notice in matched {
        text.push_str(&notice.digest_line());
        text.push('\n');
    }
    text
}

/// Matching, not-yet-sent notices for one alert. A ledger read failure
/// drops only that notice from this pass; it stays eligible later.
fn unsent_matches<'a>(db: &Database, alert: &Alert, recent: &'a [Notice]) -> Vec<&'a Notice> {
    recent
        .iter()
        .filter(|notice| alert.matches(notice))
        .filter(|notice| match db.already_sent(alert.id, notice.id) {
            Ok(sent) => !sent,
            Err(e) => {
                log::warn!(
                    "digest: ledger check failed for alert {} notice {}: {e}",
                    alert.id,
                    notice.id
                );
                false
            }
        })
        .collect()
}

/// Run the digest for every active daily alert.
pub async fn run_daily_digest(db: &Database, router: &Router, today: NaiveDate) -> Result<()> {
    let since = today.checked_sub_days(Days::new(1)).unwrap_or(NaiveDate::MIN);
    log::info!("daily digest: notices since {since}");

    let alerts = db.active_alerts(Some(Frequency::Daily))?;
    if alerts.is_empty() {
        log::info!("daily digest: no daily alerts to process");
        return Ok(());
    }

    let recent = db.recent_notices(since)?;
    if recent.is_empty() {
        log::info!("daily digest: no recent notices");
        return Ok(());
    }

    for alert in alerts {
        let matched = unsent_matches(db, &alert, &recent);
        if matched.is_empty() {
            continue;
        }

        let text = digest_text(&matched);
        if router.send(alert.channel, &alert.user_identifier, &text).await {
            for notice in &matched {
                if let Err(e) = db.mark_sent(alert.id, notice.id) {
                    log::warn!("digest: ledger write failed for alert {}: {e}", alert.id);
                }
            }
            log::info!(
                "digest sent for alert {} ({} items)",
                alert.id,
                matched.len()
            );
        } else {
            log::warn!("digest send failed for alert {} via {}", alert.id, alert.channel);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::error::Result;
    use crate::models::{Channel, Source};
    use crate::notify::testing::RecordingSender;
    use crate::notify::ChannelSender;
    use crate::store::InsertOutcome;

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

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed_daily_alert(db: &Database, keyword: Option<&str>) -> i64 {
        db.insert_alert(&Alert {
            id: 0,
            user_identifier: "chat-9".into(),
            channel: Channel::Telegram,
            keyword: keyword.map(str::to_string),
            source: None,
            frequency: Frequency::Daily,
            active: true,
        })
        .unwrap()
    }

    fn insert(db: &Database, title: &str, link: &str, d: NaiveDate) -> i64 {
        match db.insert_if_new(title, link, d, Source::Gndec).unwrap() {
            InsertOutcome::Inserted(n) => n.id,
            InsertOutcome::Duplicate => panic!("unexpected duplicate"),
        }
    }

    #[tokio::test]
    async fn two_matches_produce_one_send_and_two_ledger_rows() {
        let db = Database::open_in_memory().unwrap();
        let telegram = Arc::new(RecordingSender::default());
        let router = router_with(&telegram);

        let today = date(2025, 11, 28);
        let alert_id = seed_daily_alert(&db, Some("exam"));
        let n1 = insert(&db, "Exam Schedule", "https://x/1", today);
        let n2 = insert(&db, "Exam Fee Notice", "https://x/2", date(2025, 11, 27));
        insert(&db, "Holiday List", "https://x/3", today);

        run_daily_digest(&db, &router, today).await.unwrap();

        let calls = telegram.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.contains("Exam Schedule"));
        assert!(calls[0].1.contains("Exam Fee Notice"));
        assert!(!calls[0].1.contains("Holiday List"));

        assert!(db.already_sent(alert_id, n1).unwrap());
        assert!(db.already_sent(alert_id, n2).unwrap());
    }

    #[tokio::test]
    async fn no_matches_means_no_message() {
        let db = Database::open_in_memory().unwrap();
        let telegram = Arc::new(RecordingSender::default());
        let router = router_with(&telegram);

        let today = date(2025, 11, 28);
        seed_daily_alert(&db, Some("hostel"));
        insert(&db, "Exam Schedule", "https://x/1", today);

        run_daily_digest(&db, &router, today).await.unwrap();
        assert!(telegram.calls().is_empty());
    }

    #[tokio::test]
    async fn already_sent_notices_are_excluded_and_second_pass_is_quiet() {
        let db = Database::open_in_memory().unwrap();
        let telegram = Arc::new(RecordingSender::default());
        let router = router_with(&telegram);

        let today = date(2025, 11, 28);
        let alert_id = seed_daily_alert(&db, None);
        let n1 = insert(&db, "Exam Schedule", "https://x/1", today);
        db.mark_sent(alert_id, n1).unwrap();

        run_daily_digest(&db, &router, today).await.unwrap();
        assert!(telegram.calls().is_empty());

        // a fresh notice makes the next pass fire exactly once
        insert(&db, "New Circular", "https://x/2", today);
        run_daily_digest(&db, &router, today).await.unwrap();
        run_daily_digest(&db, &router, today).await.unwrap();
        let calls = telegram.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.contains("New Circular"));
        assert!(!calls[0].1.contains("Exam Schedule"));
    }

    #[tokio::test]
    async fn notices_outside_the_lookback_window_are_ignored() {
        let db = Database::open_in_memory().unwrap();
        let telegram = Arc::new(RecordingSender::default());
        let router = router_with(&telegram);

        let today = date(2025, 11, 28);
        seed_daily_alert(&db, None);
        insert(&db, "Stale Notice", "https://x/old", date(2025, 11, 20));

        run_daily_digest(&db, &router, today).await.unwrap();
        assert!(telegram.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_send_marks_nothing() {
        let db = Database::open_in_memory().unwrap();
        let telegram = Arc::new(RecordingSender::failing());
        let router = router_with(&telegram);

        let today = date(2025, 11, 28);
        let alert_id = seed_daily_alert(&db, None);
        let n1 = insert(&db, "Exam Schedule", "https://x/1", today);

        run_daily_digest(&db, &router, today).await.unwrap();
        assert!(!db.already_sent(alert_id, n1).unwrap());
    }
}

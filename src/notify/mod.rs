// src/notify/mod.rs

//! Delivery routing and the immediate-alert fanout.
//!
//! `notify_if_matches` is the sole coupling point between ingestion and
//! the presentation layer: it runs after every fresh notice insert.

pub mod channels;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::{Channel, ChannelsConfig, Frequency, Notice};
use crate::store::Database;

pub use channels::{TelegramSender, WhatsAppSender};

/// Uniform send capability every channel implements.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Deliver `text` to `recipient`. `Ok(())` only on channel-level
    /// acknowledgment; any lower-level fault is an error, not partial
    /// success.
    async fn send(&self, recipient: &str, text: &str) -> Result<()>;
}

/// Routes a rendered message to the sender matching the alert's channel
/// tag. Performs no retry and no batching.
pub struct Router {
    whatsapp: Box<dyn ChannelSender>,
    telegram: Box<dyn ChannelSender>,
}

impl Router {
    pub fn new(whatsapp: Box<dyn ChannelSender>, telegram: Box<dyn ChannelSender>) -> Self {
        Self { whatsapp, telegram }
    }

    /// Build the production router with credentials from the environment.
    pub fn from_env(config: &ChannelsConfig, client: Client) -> Self {
        Self::new(
            Box::new(WhatsAppSender::from_env(config, client.clone())),
            Box::new(TelegramSender::from_env(config, client)),
        )
    }

    /// Send over one channel; `true` only on confirmed success. Failures
    /// are logged and reported as `false`, never raised.
    pub async fn send(&self, channel: Channel, recipient: &str, text: &str) -> bool {
        let sender = match channel {
            Channel::Whatsapp => &self.whatsapp,
            Channel::Telegram => &self.telegram,
        };
        match sender.send(recipient, text).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{channel} send to {recipient} failed: {e}");
                false
            }
        }
    }
}

/// Fan a freshly inserted notice out to every matching immediate alert.
///
/// Per-alert failures are logged and skipped; the sent-ledger is written
/// only after a confirmed send, so a failed delivery stays eligible for
/// the next daily pass.
pub async fn notify_if_matches(db: &Database, router: &Router, notice: &Notice) {
    let alerts = match db.active_alerts(Some(Frequency::Immediate)) {
        Ok(alerts) => alerts,
        Err(e) => {
            log::warn!("notify: could not load alerts: {e}");
            return;
        }
    };

    let text = notice.alert_text();
    for alert in alerts {
        if !alert.matches(notice) {
            continue;
        }

        match db.already_sent(alert.id, notice.id) {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => {
                log::warn!("notify: ledger check failed for alert {}: {e}", alert.id);
                continue;
            }
        }

        if router.send(alert.channel, &alert.user_identifier, &text).await {
            if let Err(e) = db.mark_sent(alert.id, notice.id) {
                log::warn!("notify: ledger write failed for alert {}: {e}", alert.id);
            }
        }
    }
}

// src/notify/channels.rs

//! Concrete channel senders.
//!
//! Each sender is constructed explicitly (credentials read once from the
//! environment) and injected into the router. A sender with missing
//! credentials still constructs; its sends fail immediately with a
//! delivery error instead of panicking at startup.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::ChannelsConfig;
use crate::notify::ChannelSender;

/// Telegram Bot API sender.
pub struct TelegramSender {
    client: Client,
    token: Option<String>,
}

impl TelegramSender {
    pub fn new(client: Client, token: Option<String>) -> Self {
        Self { client, token }
    }

    pub fn from_env(config: &ChannelsConfig, client: Client) -> Self {
        Self::new(client, read_env(&config.telegram_token_env))
    }
}

#[async_trait]
impl ChannelSender for TelegramSender {
    async fn send(&self, recipient: &str, text: &str) -> Result<()> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| AppError::delivery("telegram", "bot token not configured"))?;

        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let response = self
            .client
            .post(&url)
            .form(&[
                ("chat_id", recipient),
                ("text", text),
                ("disable_web_page_preview", "true"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::delivery(
                "telegram",
                format!("API returned {}", response.status()),
            ));
        }
        Ok(())
    }
}

/// WhatsApp sender backed by the Twilio Messages API.
///
/// Recipients are expected in Twilio WhatsApp format
/// (`whatsapp:+91XXXXXXXXXX`).
pub struct WhatsAppSender {
    client: Client,
    credentials: Option<TwilioCredentials>,
}

struct TwilioCredentials {
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl WhatsAppSender {
    pub fn new(
        client: Client,
        account_sid: Option<String>,
        auth_token: Option<String>,
        from_number: Option<String>,
    ) -> Self {
        let credentials = match (account_sid, auth_token, from_number) {
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(TwilioCredentials {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => None,
        };
        Self {
            client,
            credentials,
        }
    }

    pub fn from_env(config: &ChannelsConfig, client: Client) -> Self {
        Self::new(
            client,
            read_env(&config.twilio_sid_env),
            read_env(&config.twilio_token_env),
            read_env(&config.twilio_whatsapp_from_env),
        )
    }
}

#[async_trait]
impl ChannelSender for WhatsAppSender {
    async fn send(&self, recipient: &str, text: &str) -> Result<()> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| AppError::delivery("whatsapp", "Twilio not configured"))?;

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            creds.account_sid
        );
        let response = self
            .client
            .post(&url)
            .basic_auth(&creds.account_sid, Some(&creds.auth_token))
            .form(&[
                ("From", creds.from_number.as_str()),
                ("To", recipient),
                ("Body", text),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::delivery(
                "whatsapp",
                format!("Twilio returned {}", response.status()),
            ));
        }
        Ok(())
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_telegram_fails_without_network() {
        let sender = TelegramSender::new(Client::new(), None);
        let err = sender.send("123", "hello").await.unwrap_err();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("telegram"));
    }

    #[tokio::test]
    async fn unconfigured_whatsapp_fails_without_network() {
        let sender = WhatsAppSender::new(Client::new(), Some("sid".into()), None, None);
        let err = sender.send("whatsapp:+911234567890", "hi").await.unwrap_err();
        assert!(err.to_string().contains("whatsapp"));
    }
}

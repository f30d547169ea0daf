//! Outbound notification delivery channel.
//!
//! Delivery goes through a configured webhook; without one the channel runs
//! in mock mode and only logs, which keeps the dispatcher harmless in
//! development environments.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::db::operations::notifications::PendingNotification;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelType {
    Webhook,
    Mock,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Clone)]
struct ChannelConfig {
    channel: ChannelType,
    webhook_url: Option<String>,
}

#[derive(Clone)]
pub struct NotificationChannel {
    config: ChannelConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    #[serde(rename = "notificationId")]
    notification_id: &'a str,
    #[serde(rename = "orgId")]
    org_id: &'a str,
    #[serde(rename = "userId")]
    user_id: &'a str,
    #[serde(rename = "type")]
    notification_type: &'a str,
    title: &'a str,
    body: &'a str,
}

impl NotificationChannel {
    pub fn from_env() -> Self {
        let webhook_url = std::env::var("NOTIFY_WEBHOOK_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        // Webhook only when a URL is actually configured; everything else is mock.
        let channel = match std::env::var("NOTIFY_CHANNEL").ok().as_deref() {
            Some("webhook") if webhook_url.is_some() => ChannelType::Webhook,
            Some(_) => ChannelType::Mock,
            None if webhook_url.is_some() => ChannelType::Webhook,
            None => ChannelType::Mock,
        };

        let timeout = std::env::var("NOTIFY_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            config: ChannelConfig {
                channel,
                webhook_url,
            },
            client,
        }
    }

    pub fn channel(&self) -> &ChannelType {
        &self.config.channel
    }

    pub async fn deliver(&self, notification: &PendingNotification) -> Result<(), NotifyError> {
        match self.config.channel {
            ChannelType::Mock => {
                debug!(
                    notification_id = %notification.id,
                    user_id = %notification.user_id,
                    notification_type = %notification.notification_type,
                    "mock notification delivery"
                );
                Ok(())
            }
            ChannelType::Webhook => {
                let url = self.config.webhook_url.as_deref().unwrap_or_default();
                let payload = WebhookPayload {
                    notification_id: &notification.id,
                    org_id: &notification.org_id,
                    user_id: &notification.user_id,
                    notification_type: &notification.notification_type,
                    title: &notification.title,
                    body: &notification.body,
                };

                let response = self.client.post(url).json(&payload).send().await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(NotifyError::HttpStatus { status, body });
                }

                Ok(())
            }
        }
    }
}

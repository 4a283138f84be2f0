//! Webhook channel: POSTs the rendered notification as JSON
//!
//! Push, email and SMS go through provider-facing webhooks. A 2xx response
//! means the provider accepted the notification; the provider may also
//! answer `{"delivered": true}` to confirm delivery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::entities::{NotificationChannel, NotificationQueueEntry, RenderedNotification};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChannelAdapter, DeliveryReceipt};
use crate::error::DeliveryError;

/// Request body sent to the webhook
#[derive(Debug, Serialize)]
struct WebhookRequest<'a> {
    entry_id: i64,
    user_id: i64,
    event_type: &'a str,
    channel: &'a str,
    template_key: &'a str,
    title: &'a str,
    body: &'a str,
    payload: &'a Value,
    sent_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookAck {
    #[serde(default)]
    delivered: bool,
}

/// Delivers one channel through an HTTP webhook
#[derive(Debug, Clone)]
pub struct WebhookAdapter {
    channel: NotificationChannel,
    url: Option<String>,
    client: reqwest::Client,
}

impl WebhookAdapter {
    /// `url` of `None` leaves the channel unconfigured
    pub fn new(channel: NotificationChannel, url: Option<String>, client: reqwest::Client) -> Self {
        Self {
            channel,
            url,
            client,
        }
    }
}

fn classify_status(status: StatusCode) -> Result<(), DeliveryError> {
    if status.is_success() {
        Ok(())
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(DeliveryError::Transient(format!("webhook answered {status}")))
    } else {
        Err(DeliveryError::Permanent(format!("webhook answered {status}")))
    }
}

#[async_trait]
impl ChannelAdapter for WebhookAdapter {
    fn channel(&self) -> NotificationChannel {
        self.channel
    }

    async fn deliver(
        &self,
        entry: &NotificationQueueEntry,
        content: &RenderedNotification,
        now: DateTime<Utc>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let Some(url) = self.url.as_deref() else {
            return Err(DeliveryError::NotConfigured(self.channel));
        };

        let request = WebhookRequest {
            entry_id: entry.id,
            user_id: entry.target_user_id,
            event_type: &entry.event_type,
            channel: self.channel.as_str(),
            template_key: &entry.template_key,
            title: &content.title,
            body: &content.body,
            payload: &entry.payload,
            sent_at: now,
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DeliveryError::Transient(format!("webhook request failed: {e}")))?;

        classify_status(response.status())?;

        // An unparseable body still counts as accepted
        let ack = response.json::<WebhookAck>().await.unwrap_or_default();
        tracing::debug!(
            entry_id = entry.id,
            channel = %self.channel,
            delivered = ack.delivered,
            "Webhook accepted notification"
        );

        Ok(DeliveryReceipt {
            delivered: ack.delivered,
        })
    }
}

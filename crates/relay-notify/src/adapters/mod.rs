//! Channel adapters
//!
//! One adapter per delivery channel. The processor renders the content and
//! hands it over; the adapter only knows how to get it to the user.

mod in_app;
mod webhook;

pub use in_app::InAppAdapter;
pub use webhook::WebhookAdapter;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_common::NotifyConfig;
use relay_core::entities::{NotificationChannel, NotificationQueueEntry, RenderedNotification};
use relay_core::traits::InAppNotificationRepository;

use crate::error::{DeliveryError, ProcessorResult};

/// What an adapter reports after accepting a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// The channel confirmed the user received it, not just that it was accepted
    pub delivered: bool,
}

/// Delivers rendered notifications over one channel
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// The channel this adapter serves
    fn channel(&self) -> NotificationChannel;

    /// Deliver one queue entry's content
    async fn deliver(
        &self,
        entry: &NotificationQueueEntry,
        content: &RenderedNotification,
        now: DateTime<Utc>,
    ) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Adapters keyed by channel
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<NotificationChannel, Arc<dyn ChannelAdapter>>,
}

impl AdapterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// In-app delivery plus one webhook per external channel.
    ///
    /// Channels without a webhook URL still get an adapter; it fails
    /// entries permanently with `NotConfigured`.
    pub fn from_config(
        config: &NotifyConfig,
        in_app: Arc<dyn InAppNotificationRepository>,
    ) -> ProcessorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.webhook_timeout())
            .build()?;

        let webhooks = [
            (NotificationChannel::Push, &config.push_webhook_url),
            (NotificationChannel::Email, &config.email_webhook_url),
            (NotificationChannel::Sms, &config.sms_webhook_url),
        ];

        let mut set = Self::new().with(Arc::new(InAppAdapter::new(in_app)));
        for (channel, url) in webhooks {
            set = set.with(Arc::new(WebhookAdapter::new(channel, url.clone(), client.clone())));
        }
        Ok(set)
    }

    /// Register an adapter, replacing any previous one for its channel
    pub fn with(mut self, adapter: Arc<dyn ChannelAdapter>) -> Self {
        self.adapters.insert(adapter.channel(), adapter);
        self
    }

    pub fn get(&self, channel: NotificationChannel) -> Option<&Arc<dyn ChannelAdapter>> {
        self.adapters.get(&channel)
    }

    /// Deliver through the channel's adapter
    pub async fn deliver(
        &self,
        channel: NotificationChannel,
        entry: &NotificationQueueEntry,
        content: &RenderedNotification,
        now: DateTime<Utc>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        match self.get(channel) {
            Some(adapter) => adapter.deliver(entry, content, now).await,
            None => Err(DeliveryError::NotConfigured(channel)),
        }
    }
}

impl std::fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut channels: Vec<_> = self.adapters.keys().map(|c| c.as_str()).collect();
        channels.sort_unstable();
        f.debug_struct("AdapterSet")
            .field("channels", &channels)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use relay_db::MemoryStore;
    use serde_json::json;

    use super::*;
    use relay_core::entities::NotificationEventType;

    #[tokio::test]
    async fn test_from_config_covers_every_channel() {
        let set = AdapterSet::from_config(&NotifyConfig::default(), Arc::new(MemoryStore::new()))
            .unwrap();
        for channel in NotificationChannel::ALL {
            assert_eq!(set.get(channel).map(|a| a.channel()), Some(channel));
        }
    }

    #[tokio::test]
    async fn test_missing_adapter_is_not_configured() {
        let entry = NotificationQueueEntry::pending(
            1,
            NotificationEventType::TaskCreated,
            NotificationChannel::Sms,
            "task_created",
            json!({}),
        );
        let content = RenderedNotification {
            title: "t".into(),
            body: "b".into(),
        };
        let err = AdapterSet::new()
            .deliver(NotificationChannel::Sms, &entry, &content, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::NotConfigured(NotificationChannel::Sms)));
    }
}

//! In-app channel: writes the notification row the client lists

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use relay_core::entities::{
    InAppNotification, NotificationChannel, NotificationQueueEntry, RenderedNotification,
};
use relay_core::traits::InAppNotificationRepository;
use serde_json::Value;

use super::{ChannelAdapter, DeliveryReceipt};
use crate::error::DeliveryError;

/// Stores in-app notifications, one row per queue entry
pub struct InAppAdapter {
    repo: Arc<dyn InAppNotificationRepository>,
}

impl InAppAdapter {
    pub fn new(repo: Arc<dyn InAppNotificationRepository>) -> Self {
        Self { repo }
    }
}

/// Expiry from the payload's `expires_in_days`, when positive.
///
/// A period too long to represent is the producer's mistake and will not
/// get better on retry.
fn expiry(payload: &Value, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, DeliveryError> {
    let Some(days) = payload
        .get("expires_in_days")
        .and_then(Value::as_i64)
        .filter(|days| *days > 0)
    else {
        return Ok(None);
    };
    Duration::try_days(days)
        .and_then(|period| now.checked_add_signed(period))
        .map(Some)
        .ok_or_else(|| DeliveryError::Permanent(format!("expires_in_days out of range: {days}")))
}

#[async_trait]
impl ChannelAdapter for InAppAdapter {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::InApp
    }

    async fn deliver(
        &self,
        entry: &NotificationQueueEntry,
        content: &RenderedNotification,
        now: DateTime<Utc>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let mut notification = InAppNotification::new(
            entry.target_user_id,
            content.title.clone(),
            content.body.clone(),
        );
        notification.queue_entry_id = Some(entry.id);
        notification.expires_at = expiry(&entry.payload, now)?;
        notification.created_at = now;

        let id = self.repo.upsert_for_entry(&notification).await?;
        tracing::debug!(entry_id = entry.id, notification_id = id, "In-app notification stored");

        // Visible to the user as soon as the row exists
        Ok(DeliveryReceipt { delivered: true })
    }
}

impl std::fmt::Debug for InAppAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InAppAdapter").finish_non_exhaustive()
    }
}

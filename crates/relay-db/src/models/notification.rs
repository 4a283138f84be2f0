//! Notification database models

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::FromRow;

/// Database model for notification_queue table
#[derive(Debug, Clone, FromRow)]
pub struct NotificationQueueModel {
    pub id: i64,
    pub target_user_id: i64,
    pub event_type: String,
    pub channel: String,
    pub template_key: String,
    pub payload: Value,
    pub status: String,
    pub retry_count: i32,
    pub next_attempt_at: DateTime<Utc>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for in_app_notifications table
#[derive(Debug, Clone, FromRow)]
pub struct InAppNotificationModel {
    pub id: i64,
    pub user_id: i64,
    pub queue_entry_id: Option<i64>,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub is_pinned: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Database model for notification_templates table
#[derive(Debug, Clone, FromRow)]
pub struct NotificationTemplateModel {
    pub template_key: String,
    pub channel: String,
    pub title_template: String,
    pub body_template: String,
}

/// Database model for notification_delivery_stats table
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryStatModel {
    pub day: NaiveDate,
    pub template_key: String,
    pub channel: String,
    pub sent: i64,
    pub delivered: i64,
    pub failed: i64,
}

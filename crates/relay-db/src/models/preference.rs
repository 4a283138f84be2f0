//! Notification preference database model

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveTime, Utc};
use relay_core::ChannelOverride;
use sqlx::types::Json;
use sqlx::FromRow;

/// Database model for user_notification_preferences table
#[derive(Debug, Clone, FromRow)]
pub struct PreferenceModel {
    pub user_id: i64,
    pub push_enabled: bool,
    pub in_app_enabled: bool,
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub quiet_hours_start: Option<NaiveTime>,
    pub quiet_hours_end: Option<NaiveTime>,
    pub quiet_days: Vec<i16>,
    pub event_overrides: Json<BTreeMap<String, ChannelOverride>>,
    pub utc_offset_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

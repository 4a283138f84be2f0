//! Support ticket database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for support_events table
#[derive(Debug, Clone, FromRow)]
pub struct SupportEventModel {
    pub id: i64,
    pub chat_room_id: i64,
    pub user_id: i64,
    pub admin_id: Option<i64>,
    pub status: String,
    pub rating: Option<i32>,
    pub review: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for support_event_logs table
#[derive(Debug, Clone, FromRow)]
pub struct SupportEventLogModel {
    pub id: i64,
    pub event_id: i64,
    pub admin_id: Option<i64>,
    pub old_status: Option<String>,
    pub new_status: String,
    pub created_at: DateTime<Utc>,
}

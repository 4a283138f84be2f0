//! Message and read cursor database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for messages table
#[derive(Debug, Clone, FromRow)]
pub struct MessageModel {
    pub id: i64,
    pub room_id: i64,
    pub sender_id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Database model for read_cursors table
#[derive(Debug, Clone, FromRow)]
pub struct ReadCursorModel {
    pub user_id: i64,
    pub room_id: i64,
    pub last_read_message_id: i64,
    pub updated_at: DateTime<Utc>,
}

/// One row of the per-room unread aggregate
#[derive(Debug, Clone, Copy, FromRow)]
pub struct UnreadCountModel {
    pub room_id: i64,
    pub unread: i64,
}

//! Room database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for rooms table
#[derive(Debug, Clone, FromRow)]
pub struct RoomModel {
    pub id: i64,
    pub kind: String,
    pub creator_id: i64,
    pub participant_id: i64,
    pub created_at: DateTime<Utc>,
}

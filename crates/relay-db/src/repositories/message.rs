//! PostgreSQL implementation of MessageRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::Message;
use relay_core::traits::{MessageRepository, RepoResult};

use crate::models::{MessageModel, UnreadCountModel};

use super::error::map_db_error;

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self))]
    async fn latest_id(&self, room_id: i64) -> RepoResult<Option<i64>> {
        let latest: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(id) FROM messages WHERE room_id = $1
            "#,
        )
        .bind(room_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(latest)
    }

    #[instrument(skip(self))]
    async fn unread_counts(&self, user_id: i64) -> RepoResult<Vec<(i64, i64)>> {
        // One pass over the user's rooms; a missing cursor counts everything
        let rows = sqlx::query_as::<_, UnreadCountModel>(
            r#"
            SELECT r.id AS room_id, COUNT(m.id) AS unread
            FROM rooms r
            LEFT JOIN read_cursors c
                ON c.room_id = r.id AND c.user_id = $1
            LEFT JOIN messages m
                ON m.room_id = r.id AND m.id > COALESCE(c.last_read_message_id, 0)
            WHERE r.creator_id = $1 OR r.participant_id = $1
            GROUP BY r.id
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(|r| (r.room_id, r.unread)).collect())
    }

    #[instrument(skip(self, body))]
    async fn append(&self, room_id: i64, sender_id: i64, body: &str) -> RepoResult<Message> {
        let model = sqlx::query_as::<_, MessageModel>(
            r#"
            INSERT INTO messages (room_id, sender_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, room_id, sender_id, body, sent_at
            "#,
        )
        .bind(room_id)
        .bind(sender_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Message::from(model))
    }
}

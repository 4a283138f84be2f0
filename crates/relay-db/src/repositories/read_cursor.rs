//! PostgreSQL implementation of ReadCursorRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::ReadCursor;
use relay_core::traits::{ReadCursorRepository, RepoResult};

use crate::models::ReadCursorModel;

use super::error::map_db_error;

/// PostgreSQL implementation of ReadCursorRepository
#[derive(Clone)]
pub struct PgReadCursorRepository {
    pool: PgPool,
}

impl PgReadCursorRepository {
    /// Create a new PgReadCursorRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadCursorRepository for PgReadCursorRepository {
    #[instrument(skip(self))]
    async fn advance(
        &self,
        user_id: i64,
        room_id: i64,
        message_id: i64,
    ) -> RepoResult<ReadCursor> {
        // GREATEST keeps the cursor monotonic under concurrent writers
        let model = sqlx::query_as::<_, ReadCursorModel>(
            r#"
            INSERT INTO read_cursors (user_id, room_id, last_read_message_id, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, room_id) DO UPDATE
            SET last_read_message_id = GREATEST(read_cursors.last_read_message_id, EXCLUDED.last_read_message_id),
                updated_at = NOW()
            RETURNING user_id, room_id, last_read_message_id, updated_at
            "#,
        )
        .bind(user_id)
        .bind(room_id)
        .bind(message_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ReadCursor::from(model))
    }
}

//! PostgreSQL implementation of RoomRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::Room;
use relay_core::traits::{RepoResult, RoomRepository};

use crate::models::RoomModel;

use super::error::map_db_error;

/// PostgreSQL implementation of RoomRepository
#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    /// Create a new PgRoomRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Room>> {
        let result = sqlx::query_as::<_, RoomModel>(
            r#"
            SELECT id, kind, creator_id, participant_id, created_at
            FROM rooms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Room::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn create(&self, room: &Room) -> RepoResult<Room> {
        let model = sqlx::query_as::<_, RoomModel>(
            r#"
            INSERT INTO rooms (kind, creator_id, participant_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, kind, creator_id, participant_id, created_at
            "#,
        )
        .bind(room.kind.as_str())
        .bind(room.creator_id)
        .bind(room.participant_id)
        .bind(room.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Room::try_from(model)
    }
}

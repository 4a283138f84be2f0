//! PostgreSQL implementation of SupportEventRepository

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use relay_core::entities::{SupportEvent, SupportEventLog, SupportStatus};
use relay_core::traits::{RepoResult, SupportEventRepository};
use relay_core::DomainError;

use crate::models::{SupportEventLogModel, SupportEventModel};

use super::error::{map_db_error, support_event_not_found};

/// PostgreSQL implementation of SupportEventRepository
#[derive(Clone)]
pub struct PgSupportEventRepository {
    pool: PgPool,
}

impl PgSupportEventRepository {
    /// Create a new PgSupportEventRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_log(
    tx: &mut Transaction<'_, Postgres>,
    log: &SupportEventLog,
    event_id: i64,
) -> RepoResult<()> {
    sqlx::query(
        r#"
        INSERT INTO support_event_logs (event_id, admin_id, old_status, new_status, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(event_id)
    .bind(log.admin_id)
    .bind(log.old_status.map(SupportStatus::as_str))
    .bind(log.new_status.as_str())
    .bind(log.created_at)
    .execute(&mut **tx)
    .await
    .map_err(map_db_error)?;

    Ok(())
}

#[async_trait]
impl SupportEventRepository for PgSupportEventRepository {
    #[instrument(skip(self, event), fields(room_id = event.chat_room_id))]
    async fn create(&self, event: &SupportEvent) -> RepoResult<SupportEvent> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let model = sqlx::query_as::<_, SupportEventModel>(
            r#"
            INSERT INTO support_events (chat_room_id, user_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, chat_room_id, user_id, admin_id, status, rating, review,
                      closed_at, created_at, updated_at
            "#,
        )
        .bind(event.chat_room_id)
        .bind(event.user_id)
        .bind(event.status.as_str())
        .bind(event.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let created = SupportEvent::try_from(model)?;
        let log = SupportEventLog::entry(created.id, None, None, created.status, created.created_at);
        insert_log(&mut tx, &log, created.id).await?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(created)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<SupportEvent>> {
        let result = sqlx::query_as::<_, SupportEventModel>(
            r#"
            SELECT id, chat_room_id, user_id, admin_id, status, rating, review,
                   closed_at, created_at, updated_at
            FROM support_events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(SupportEvent::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_logs(&self, event_id: i64) -> RepoResult<Vec<SupportEventLog>> {
        let results = sqlx::query_as::<_, SupportEventLogModel>(
            r#"
            SELECT id, event_id, admin_id, old_status, new_status, created_at
            FROM support_event_logs
            WHERE event_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(SupportEventLog::try_from).collect()
    }

    #[instrument(skip(self, event, log), fields(event_id = event.id, to = %event.status))]
    async fn apply_transition(
        &self,
        event: &SupportEvent,
        expected_status: SupportStatus,
        log: &SupportEventLog,
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Guarded on the status we read and on the rating not having been
        // set by someone else in between
        let result = sqlx::query(
            r#"
            UPDATE support_events
            SET status = $2, admin_id = $3, rating = $4, review = $5,
                closed_at = $6, updated_at = $7
            WHERE id = $1 AND status = $8
              AND (rating IS NULL OR rating IS NOT DISTINCT FROM $4)
            "#,
        )
        .bind(event.id)
        .bind(event.status.as_str())
        .bind(event.admin_id)
        .bind(event.rating)
        .bind(&event.review)
        .bind(event.closed_at)
        .bind(event.updated_at)
        .bind(expected_status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT id FROM support_events WHERE id = $1")
                    .bind(event.id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(map_db_error)?;
            return Err(match exists {
                Some(_) => DomainError::ConcurrentModification,
                None => support_event_not_found(event.id),
            });
        }

        insert_log(&mut tx, log, event.id).await?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, event), fields(event_id = event.id))]
    async fn record_rating(&self, event: &SupportEvent) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE support_events
            SET rating = $2, review = $3, updated_at = $4
            WHERE id = $1 AND rating IS NULL
            "#,
        )
        .bind(event.id)
        .bind(event.rating)
        .bind(&event.review)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return match self.find_by_id(event.id).await? {
                Some(_) => Err(DomainError::AlreadyRated),
                None => Err(support_event_not_found(event.id)),
            };
        }

        Ok(())
    }
}

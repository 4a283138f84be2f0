//! PostgreSQL implementation of InAppNotificationRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::InAppNotification;
use relay_core::traits::{InAppNotificationRepository, RepoResult};

use crate::models::InAppNotificationModel;

use super::error::map_db_error;

/// PostgreSQL implementation of InAppNotificationRepository
#[derive(Clone)]
pub struct PgInAppNotificationRepository {
    pool: PgPool,
}

impl PgInAppNotificationRepository {
    /// Create a new PgInAppNotificationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InAppNotificationRepository for PgInAppNotificationRepository {
    #[instrument(skip(self, notification), fields(user_id = notification.user_id))]
    async fn upsert_for_entry(&self, notification: &InAppNotification) -> RepoResult<i64> {
        // A retried entry refreshes its row instead of duplicating it
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO in_app_notifications
                (user_id, queue_entry_id, title, body, is_read, is_pinned, expires_at, created_at)
            VALUES ($1, $2, $3, $4, FALSE, FALSE, $5, $6)
            ON CONFLICT (queue_entry_id) DO UPDATE
            SET title = EXCLUDED.title, body = EXCLUDED.body
            RETURNING id
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.queue_entry_id)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(notification.expires_at)
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(id)
    }

    #[instrument(skip(self))]
    async fn list_for_user(
        &self,
        user_id: i64,
        unread_only: bool,
        now: DateTime<Utc>,
        limit: i64,
    ) -> RepoResult<Vec<InAppNotification>> {
        let results = sqlx::query_as::<_, InAppNotificationModel>(
            r#"
            SELECT id, user_id, queue_entry_id, title, body, is_read, is_pinned,
                   read_at, expires_at, created_at
            FROM in_app_notifications
            WHERE user_id = $1
              AND (NOT $2 OR is_read = FALSE)
              AND (expires_at IS NULL OR expires_at > $3)
            ORDER BY is_pinned DESC, created_at DESC, id DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(now)
        .bind(limit.clamp(1, 100))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(InAppNotification::from).collect())
    }

    #[instrument(skip(self))]
    async fn mark_read(
        &self,
        id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<InAppNotification>> {
        let result = sqlx::query_as::<_, InAppNotificationModel>(
            r#"
            UPDATE in_app_notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, $3)
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, queue_entry_id, title, body, is_read, is_pinned,
                      read_at, expires_at, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(InAppNotification::from))
    }

    #[instrument(skip(self))]
    async fn set_pinned(
        &self,
        id: i64,
        user_id: i64,
        pinned: bool,
    ) -> RepoResult<Option<InAppNotification>> {
        let result = sqlx::query_as::<_, InAppNotificationModel>(
            r#"
            UPDATE in_app_notifications
            SET is_pinned = $3
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, queue_entry_id, title, body, is_read, is_pinned,
                      read_at, expires_at, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(pinned)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(InAppNotification::from))
    }

    #[instrument(skip(self))]
    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM in_app_notifications
            WHERE is_read = TRUE AND is_pinned = FALSE AND created_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM in_app_notifications
            WHERE expires_at IS NOT NULL AND expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}

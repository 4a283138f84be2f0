//! PostgreSQL implementation of NotificationQueueRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::{NotificationQueueEntry, QueueStatus};
use relay_core::traits::{NotificationQueueRepository, RepoResult};

use crate::models::NotificationQueueModel;

use super::error::{map_db_error, queue_entry_not_found};

const QUEUE_COLUMNS: &str = "id, target_user_id, event_type, channel, template_key, payload, \
     status, retry_count, next_attempt_at, failure_reason, created_at, updated_at";

/// PostgreSQL implementation of NotificationQueueRepository
#[derive(Clone)]
pub struct PgNotificationQueueRepository {
    pool: PgPool,
}

impl PgNotificationQueueRepository {
    /// Create a new PgNotificationQueueRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationQueueRepository for PgNotificationQueueRepository {
    #[instrument(skip(self, entry), fields(target = entry.target_user_id))]
    async fn enqueue(&self, entry: &NotificationQueueEntry) -> RepoResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO notification_queue
                (target_user_id, event_type, channel, template_key, payload,
                 status, retry_count, next_attempt_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', 0, $6, $7, $7)
            RETURNING id
            "#,
        )
        .bind(entry.target_user_id)
        .bind(&entry.event_type)
        .bind(&entry.channel)
        .bind(&entry.template_key)
        .bind(&entry.payload)
        .bind(entry.next_attempt_at)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(id)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<NotificationQueueEntry>> {
        let sql = format!("SELECT {QUEUE_COLUMNS} FROM notification_queue WHERE id = $1");
        let result = sqlx::query_as::<_, NotificationQueueModel>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        result.map(NotificationQueueEntry::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        after_id: i64,
        limit: i64,
    ) -> RepoResult<Vec<NotificationQueueEntry>> {
        let sql = format!(
            "SELECT {QUEUE_COLUMNS} FROM notification_queue \
             WHERE status = 'pending' AND next_attempt_at <= $1 AND id > $2 \
             ORDER BY id ASC LIMIT $3"
        );
        let results = sqlx::query_as::<_, NotificationQueueModel>(&sql)
            .bind(now)
            .bind(after_id)
            .bind(limit.max(1))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        results
            .into_iter()
            .map(NotificationQueueEntry::try_from)
            .collect()
    }

    #[instrument(skip(self))]
    async fn mark_sent(&self, id: i64, at: DateTime<Utc>) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE notification_queue
            SET status = $2, failure_reason = NULL, updated_at = $3
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(QueueStatus::Sent.as_str())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(queue_entry_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_failed(
        &self,
        id: i64,
        reason: &str,
        retry_count: i32,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE notification_queue
            SET status = $2, failure_reason = $3, retry_count = $4, updated_at = $5
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(QueueStatus::Failed.as_str())
        .bind(reason)
        .bind(retry_count)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(queue_entry_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn schedule_retry(
        &self,
        id: i64,
        retry_count: i32,
        next_attempt_at: DateTime<Utc>,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE notification_queue
            SET retry_count = $2, next_attempt_at = $3, failure_reason = $4, updated_at = $5
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(retry_count)
        .bind(next_attempt_at)
        .bind(reason)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(queue_entry_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM notification_queue
            WHERE status IN ('sent', 'failed') AND updated_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}

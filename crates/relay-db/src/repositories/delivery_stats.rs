//! PostgreSQL implementation of DeliveryStatsRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::DeliveryStat;
use relay_core::traits::{DeliveryStatsRepository, RepoResult};

use crate::models::DeliveryStatModel;

use super::error::map_db_error;

/// PostgreSQL implementation of DeliveryStatsRepository
#[derive(Clone)]
pub struct PgDeliveryStatsRepository {
    pool: PgPool,
}

impl PgDeliveryStatsRepository {
    /// Create a new PgDeliveryStatsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryStatsRepository for PgDeliveryStatsRepository {
    #[instrument(skip(self))]
    async fn record(&self, stat: &DeliveryStat) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notification_delivery_stats
                (day, template_key, channel, sent, delivered, failed)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (day, template_key, channel) DO UPDATE
            SET sent = notification_delivery_stats.sent + EXCLUDED.sent,
                delivered = notification_delivery_stats.delivered + EXCLUDED.delivered,
                failed = notification_delivery_stats.failed + EXCLUDED.failed
            "#,
        )
        .bind(stat.day)
        .bind(&stat.template_key)
        .bind(&stat.channel)
        .bind(stat.sent)
        .bind(stat.delivered)
        .bind(stat.failed)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_day(&self, day: NaiveDate) -> RepoResult<Vec<DeliveryStat>> {
        let results = sqlx::query_as::<_, DeliveryStatModel>(
            r#"
            SELECT day, template_key, channel, sent, delivered, failed
            FROM notification_delivery_stats
            WHERE day = $1
            ORDER BY template_key, channel
            "#,
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(DeliveryStat::from).collect())
    }
}

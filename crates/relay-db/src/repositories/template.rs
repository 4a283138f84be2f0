//! PostgreSQL implementation of NotificationTemplateRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::NotificationTemplate;
use relay_core::traits::{NotificationTemplateRepository, RepoResult};

use crate::models::NotificationTemplateModel;

use super::error::map_db_error;

/// PostgreSQL implementation of NotificationTemplateRepository
#[derive(Clone)]
pub struct PgNotificationTemplateRepository {
    pool: PgPool,
}

impl PgNotificationTemplateRepository {
    /// Create a new PgNotificationTemplateRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationTemplateRepository for PgNotificationTemplateRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        template_key: &str,
        channel: &str,
    ) -> RepoResult<Option<NotificationTemplate>> {
        let result = sqlx::query_as::<_, NotificationTemplateModel>(
            r#"
            SELECT template_key, channel, title_template, body_template
            FROM notification_templates
            WHERE template_key = $1 AND channel = $2
            "#,
        )
        .bind(template_key)
        .bind(channel)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(NotificationTemplate::from))
    }
}

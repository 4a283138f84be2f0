//! PostgreSQL implementation of PreferenceRepository

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::UserNotificationPreference;
use relay_core::traits::{PreferenceRepository, RepoResult};
use relay_core::DomainError;

use crate::models::PreferenceModel;

use super::error::map_db_error;

/// PostgreSQL implementation of PreferenceRepository
#[derive(Clone)]
pub struct PgPreferenceRepository {
    pool: PgPool,
}

impl PgPreferenceRepository {
    /// Create a new PgPreferenceRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceRepository for PgPreferenceRepository {
    #[instrument(skip(self))]
    async fn find(&self, user_id: i64) -> RepoResult<Option<UserNotificationPreference>> {
        let result = sqlx::query_as::<_, PreferenceModel>(
            r#"
            SELECT user_id, push_enabled, in_app_enabled, email_enabled, sms_enabled,
                   quiet_hours_start, quiet_hours_end, quiet_days, event_overrides,
                   utc_offset_minutes, created_at, updated_at
            FROM user_notification_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(UserNotificationPreference::from))
    }

    #[instrument(skip(self, preference), fields(user_id = preference.user_id))]
    async fn insert_if_absent(&self, preference: &UserNotificationPreference) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_notification_preferences
                (user_id, push_enabled, in_app_enabled, email_enabled, sms_enabled,
                 quiet_hours_start, quiet_hours_end, quiet_days, event_overrides,
                 utc_offset_minutes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(preference.user_id)
        .bind(preference.push_enabled)
        .bind(preference.in_app_enabled)
        .bind(preference.email_enabled)
        .bind(preference.sms_enabled)
        .bind(preference.quiet_hours_start)
        .bind(preference.quiet_hours_end)
        .bind(&preference.quiet_days)
        .bind(Json(&preference.event_overrides))
        .bind(preference.utc_offset_minutes)
        .bind(preference.created_at)
        .bind(preference.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, preference), fields(user_id = preference.user_id))]
    async fn update(&self, preference: &UserNotificationPreference) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE user_notification_preferences
            SET push_enabled = $2, in_app_enabled = $3, email_enabled = $4, sms_enabled = $5,
                quiet_hours_start = $6, quiet_hours_end = $7, quiet_days = $8,
                event_overrides = $9, utc_offset_minutes = $10, updated_at = $11
            WHERE user_id = $1
            "#,
        )
        .bind(preference.user_id)
        .bind(preference.push_enabled)
        .bind(preference.in_app_enabled)
        .bind(preference.email_enabled)
        .bind(preference.sms_enabled)
        .bind(preference.quiet_hours_start)
        .bind(preference.quiet_hours_end)
        .bind(&preference.quiet_days)
        .bind(Json(&preference.event_overrides))
        .bind(preference.utc_offset_minutes)
        .bind(preference.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::InternalError(format!(
                "Preference row missing for user {}",
                preference.user_id
            )));
        }

        Ok(())
    }
}

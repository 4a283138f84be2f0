//! Preference service
//!
//! Lazily creates preference records and applies validated partial updates.

use chrono::Utc;
use relay_core::entities::{PreferenceUpdate, UserNotificationPreference};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Preference service
pub struct PreferenceService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PreferenceService<'a> {
    /// Create a new PreferenceService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Get the user's preference, creating the default record on first access.
    ///
    /// Concurrent first reads both insert-if-absent and then re-read, so they
    /// see the same row.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: i64) -> ServiceResult<UserNotificationPreference> {
        let repo = self.ctx.preference_repo();
        if let Some(pref) = repo.find(user_id).await? {
            return Ok(pref);
        }

        debug!("Creating default preference");
        repo.insert_if_absent(&UserNotificationPreference::with_defaults(user_id))
            .await?;

        repo.find(user_id)
            .await?
            .ok_or_else(|| ServiceError::internal("preference missing after insert"))
    }

    /// Apply a partial update document.
    ///
    /// The whole document is validated before anything is written.
    #[instrument(skip(self, document))]
    pub async fn update(
        &self,
        user_id: i64,
        document: &Value,
    ) -> ServiceResult<UserNotificationPreference> {
        let update = PreferenceUpdate::from_json(document)?;

        let mut pref = self.get(user_id).await?;
        if update.is_empty() {
            return Ok(pref);
        }

        update.apply(&mut pref);
        pref.updated_at = Utc::now();
        self.ctx.preference_repo().update(&pref).await?;

        info!(user_id, "Notification preference updated");
        Ok(pref)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use relay_core::entities::NotificationChannel;
    use relay_db::MemoryStore;
    use serde_json::json;

    use super::*;

    fn ctx() -> ServiceContext {
        ServiceContext::builder_with_store(MemoryStore::new())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_creates_defaults_once() {
        let ctx = ctx();
        let service = PreferenceService::new(&ctx);

        let first = service.get(42).await.unwrap();
        assert!(first.push_enabled);
        assert!(!first.sms_enabled);
        assert!(!first.channel_enabled("task_created", NotificationChannel::Email));
        assert!(first.channel_enabled("task_completed", NotificationChannel::Email));

        let second = service.get(42).await.unwrap();
        assert_eq!(first.created_at, second.created_at);
    }

    #[tokio::test]
    async fn test_update_merges_overrides() {
        let ctx = ctx();
        let service = PreferenceService::new(&ctx);

        let updated = service
            .update(
                7,
                &json!({
                    "quiet_hours_start": "22:00:00",
                    "quiet_hours_end": "07:00:00",
                    "quiet_days": [7, 6, 6],
                    "event_overrides": {"chat_new_message": {"push": false}}
                }),
            )
            .await
            .unwrap();

        assert_eq!(updated.quiet_hours_start, NaiveTime::from_hms_opt(22, 0, 0));
        assert_eq!(updated.quiet_days, vec![6, 7]);
        assert!(!updated.channel_enabled("chat_new_message", NotificationChannel::Push));
        // Untouched keys of the same override keep their value
        assert!(updated.channel_enabled("chat_new_message", NotificationChannel::InApp));

        let stored = service.get(7).await.unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_invalid_document_writes_nothing() {
        let ctx = ctx();
        let service = PreferenceService::new(&ctx);
        let before = service.get(3).await.unwrap();

        let err = service
            .update(3, &json!({"push_enabled": false, "quiet_days": [8]}))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_PREFERENCE");

        let err = service
            .update(3, &json!({"quiet_hours_start": "25:00:00", "quiet_hours_end": "07:00:00"}))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = service.update(3, &json!({"colour": "blue"})).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        assert_eq!(service.get(3).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_storage_unavailable_surfaces() {
        let store = MemoryStore::new();
        store.set_available(false);
        let ctx = ServiceContext::builder_with_store(store).build().unwrap();

        let err = PreferenceService::new(&ctx).get(1).await.unwrap_err();
        assert!(err.is_storage_unavailable());
    }
}

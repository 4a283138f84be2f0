//! In-app notification service

use chrono::Utc;
use relay_core::entities::InAppNotification;
use relay_core::DomainError;
use tracing::instrument;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Most notifications returned by one listing
pub const LIST_LIMIT: i64 = 50;

/// In-app notification service
pub struct NotificationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> NotificationService<'a> {
    /// Create a new NotificationService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Latest non-expired notifications, pinned first
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> ServiceResult<Vec<InAppNotification>> {
        Ok(self
            .ctx
            .in_app_repo()
            .list_for_user(user_id, unread_only, Utc::now(), LIST_LIMIT)
            .await?)
    }

    /// Mark one of the user's notifications read
    #[instrument(skip(self))]
    pub async fn mark_read(&self, user_id: i64, id: i64) -> ServiceResult<InAppNotification> {
        Ok(self
            .ctx
            .in_app_repo()
            .mark_read(id, user_id, Utc::now())
            .await?
            .ok_or(DomainError::NotificationNotFound(id))?)
    }

    /// Pin or unpin one of the user's notifications
    #[instrument(skip(self))]
    pub async fn set_pinned(
        &self,
        user_id: i64,
        id: i64,
        pinned: bool,
    ) -> ServiceResult<InAppNotification> {
        Ok(self
            .ctx
            .in_app_repo()
            .set_pinned(id, user_id, pinned)
            .await?
            .ok_or(DomainError::NotificationNotFound(id))?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use relay_core::traits::InAppNotificationRepository;
    use relay_db::MemoryStore;

    use super::*;

    async fn seed(store: &MemoryStore, user_id: i64, title: &str) -> InAppNotification {
        let mut n = InAppNotification::new(user_id, title.to_string(), "body".to_string());
        n.id = store.upsert_for_entry(&n).await.unwrap();
        n
    }

    #[tokio::test]
    async fn test_read_and_pin() {
        let store = MemoryStore::new();
        let ctx = ServiceContext::builder_with_store(store.clone()).build().unwrap();
        let service = NotificationService::new(&ctx);

        let first = seed(&store, 1, "first").await;
        let second = seed(&store, 1, "second").await;

        let read = service.mark_read(1, first.id).await.unwrap();
        assert!(read.is_read);
        let unread = service.list(1, true).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, second.id);

        service.set_pinned(1, first.id, true).await.unwrap();
        let all = service.list(1, false).await.unwrap();
        assert_eq!(all[0].id, first.id);
    }

    #[tokio::test]
    async fn test_other_users_rows_are_hidden() {
        let store = MemoryStore::new();
        let ctx = ServiceContext::builder_with_store(store.clone()).build().unwrap();
        let service = NotificationService::new(&ctx);
        let n = seed(&store, 1, "mine").await;

        let err = service.mark_read(2, n.id).await.unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_NOTIFICATION");
        assert_eq!(err.status_code(), 404);
        assert!(service.list(2, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_rows_are_not_listed() {
        let store = MemoryStore::new();
        let ctx = ServiceContext::builder_with_store(store.clone()).build().unwrap();

        let mut n = InAppNotification::new(1, "old".into(), "body".into());
        n.expires_at = Some(Utc::now() - Duration::minutes(1));
        store.upsert_for_entry(&n).await.unwrap();

        let listed = NotificationService::new(&ctx).list(1, false).await.unwrap();
        assert!(listed.is_empty());
    }
}

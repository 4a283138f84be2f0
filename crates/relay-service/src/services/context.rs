//! Service context - dependency container for services
//!
//! Holds all repositories and the ticket broadcaster needed by services.

use std::sync::Arc;

use relay_core::traits::{
    InAppNotificationRepository, MessageRepository, NullBroadcaster, PreferenceRepository,
    ReadCursorRepository, RoomRepository, SupportEventRepository, TicketBroadcaster,
};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// This is the main dependency container that gets passed to all services.
/// Repositories are trait objects so the same services run over PostgreSQL
/// or the in-memory store.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    room_repo: Arc<dyn RoomRepository>,
    message_repo: Arc<dyn MessageRepository>,
    read_cursor_repo: Arc<dyn ReadCursorRepository>,
    preference_repo: Arc<dyn PreferenceRepository>,
    in_app_repo: Arc<dyn InAppNotificationRepository>,
    support_event_repo: Arc<dyn SupportEventRepository>,

    // Ticket event fan-out
    broadcaster: Arc<dyn TicketBroadcaster>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        room_repo: Arc<dyn RoomRepository>,
        message_repo: Arc<dyn MessageRepository>,
        read_cursor_repo: Arc<dyn ReadCursorRepository>,
        preference_repo: Arc<dyn PreferenceRepository>,
        in_app_repo: Arc<dyn InAppNotificationRepository>,
        support_event_repo: Arc<dyn SupportEventRepository>,
        broadcaster: Arc<dyn TicketBroadcaster>,
    ) -> Self {
        Self {
            room_repo,
            message_repo,
            read_cursor_repo,
            preference_repo,
            in_app_repo,
            support_event_repo,
            broadcaster,
        }
    }

    /// Start a builder
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    /// Builder pre-filled with one store backing every repository
    pub fn builder_with_store<S>(store: S) -> ServiceContextBuilder
    where
        S: RoomRepository
            + MessageRepository
            + ReadCursorRepository
            + PreferenceRepository
            + InAppNotificationRepository
            + SupportEventRepository
            + Clone
            + 'static,
    {
        ServiceContextBuilder::new()
            .room_repo(Arc::new(store.clone()))
            .message_repo(Arc::new(store.clone()))
            .read_cursor_repo(Arc::new(store.clone()))
            .preference_repo(Arc::new(store.clone()))
            .in_app_repo(Arc::new(store.clone()))
            .support_event_repo(Arc::new(store))
    }

    // === Repositories ===

    /// Get the room repository
    pub fn room_repo(&self) -> &dyn RoomRepository {
        self.room_repo.as_ref()
    }

    /// Get the message repository
    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    /// Get the read cursor repository
    pub fn read_cursor_repo(&self) -> &dyn ReadCursorRepository {
        self.read_cursor_repo.as_ref()
    }

    /// Get the preference repository
    pub fn preference_repo(&self) -> &dyn PreferenceRepository {
        self.preference_repo.as_ref()
    }

    /// Get the in-app notification repository
    pub fn in_app_repo(&self) -> &dyn InAppNotificationRepository {
        self.in_app_repo.as_ref()
    }

    /// Get the support event repository
    pub fn support_event_repo(&self) -> &dyn SupportEventRepository {
        self.support_event_repo.as_ref()
    }

    // === Broadcast ===

    /// Get the ticket broadcaster
    pub fn broadcaster(&self) -> &dyn TicketBroadcaster {
        self.broadcaster.as_ref()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("broadcaster", &"dyn TicketBroadcaster")
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    room_repo: Option<Arc<dyn RoomRepository>>,
    message_repo: Option<Arc<dyn MessageRepository>>,
    read_cursor_repo: Option<Arc<dyn ReadCursorRepository>>,
    preference_repo: Option<Arc<dyn PreferenceRepository>>,
    in_app_repo: Option<Arc<dyn InAppNotificationRepository>>,
    support_event_repo: Option<Arc<dyn SupportEventRepository>>,
    broadcaster: Option<Arc<dyn TicketBroadcaster>>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_repo(mut self, repo: Arc<dyn RoomRepository>) -> Self {
        self.room_repo = Some(repo);
        self
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn read_cursor_repo(mut self, repo: Arc<dyn ReadCursorRepository>) -> Self {
        self.read_cursor_repo = Some(repo);
        self
    }

    pub fn preference_repo(mut self, repo: Arc<dyn PreferenceRepository>) -> Self {
        self.preference_repo = Some(repo);
        self
    }

    pub fn in_app_repo(mut self, repo: Arc<dyn InAppNotificationRepository>) -> Self {
        self.in_app_repo = Some(repo);
        self
    }

    pub fn support_event_repo(mut self, repo: Arc<dyn SupportEventRepository>) -> Self {
        self.support_event_repo = Some(repo);
        self
    }

    pub fn broadcaster(mut self, broadcaster: Arc<dyn TicketBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Build the ServiceContext
    ///
    /// Without a broadcaster, ticket events are dropped.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any repository is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        fn required<T>(value: Option<T>, name: &str) -> ServiceResult<T> {
            value.ok_or_else(|| ServiceError::validation(format!("{name} is required")))
        }

        Ok(ServiceContext::new(
            required(self.room_repo, "room_repo")?,
            required(self.message_repo, "message_repo")?,
            required(self.read_cursor_repo, "read_cursor_repo")?,
            required(self.preference_repo, "preference_repo")?,
            required(self.in_app_repo, "in_app_repo")?,
            required(self.support_event_repo, "support_event_repo")?,
            self.broadcaster.unwrap_or_else(|| Arc::new(NullBroadcaster)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use relay_db::MemoryStore;

    use super::*;

    #[test]
    fn test_builder_requires_repositories() {
        let err = ServiceContext::builder().build().unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("room_repo"));
    }

    #[test]
    fn test_builder_with_store() {
        let ctx = ServiceContext::builder_with_store(MemoryStore::new())
            .build()
            .unwrap();
        assert!(format!("{ctx:?}").contains("ServiceContext"));
    }
}

//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::entities::{
    DeliveryStat, InAppNotification, Message, NotificationQueueEntry, NotificationTemplate,
    ReadCursor, Room, SupportEvent, SupportEventLog, SupportStatus, UserNotificationPreference,
};
use crate::error::DomainError;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Room Repository
// ============================================================================

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Find room by ID
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Room>>;

    /// Create a room, returning it with its assigned id
    async fn create(&self, room: &Room) -> RepoResult<Room>;
}

// ============================================================================
// Message Repository
// ============================================================================

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Latest message id in a room
    async fn latest_id(&self, room_id: i64) -> RepoResult<Option<i64>>;

    /// Unread count for every room the user belongs to, in one query.
    ///
    /// Rooms with nothing unread are included with a count of 0.
    async fn unread_counts(&self, user_id: i64) -> RepoResult<Vec<(i64, i64)>>;

    /// Append a message, returning it with its assigned id
    async fn append(&self, room_id: i64, sender_id: i64, body: &str) -> RepoResult<Message>;
}

// ============================================================================
// Read Cursor Repository
// ============================================================================

#[async_trait]
pub trait ReadCursorRepository: Send + Sync {
    /// Upsert the cursor, keeping the greater of the stored and given ids
    async fn advance(&self, user_id: i64, room_id: i64, message_id: i64)
        -> RepoResult<ReadCursor>;
}

// ============================================================================
// Notification Queue Repository
// ============================================================================

#[async_trait]
pub trait NotificationQueueRepository: Send + Sync {
    /// Insert a pending entry, returning its id
    async fn enqueue(&self, entry: &NotificationQueueEntry) -> RepoResult<i64>;

    /// Find entry by ID
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<NotificationQueueEntry>>;

    /// Pending entries due at `now` with id greater than `after_id`, oldest first
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        after_id: i64,
        limit: i64,
    ) -> RepoResult<Vec<NotificationQueueEntry>>;

    /// Mark a pending entry as sent
    async fn mark_sent(&self, id: i64, at: DateTime<Utc>) -> RepoResult<()>;

    /// Mark a pending entry as terminally failed
    async fn mark_failed(&self, id: i64, reason: &str, retry_count: i32, at: DateTime<Utc>)
        -> RepoResult<()>;

    /// Keep the entry pending and push its next attempt out
    async fn schedule_retry(
        &self,
        id: i64,
        retry_count: i32,
        next_attempt_at: DateTime<Utc>,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RepoResult<()>;

    /// Delete sent/failed entries last updated before `cutoff`
    async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> RepoResult<u64>;
}

// ============================================================================
// Preference Repository
// ============================================================================

#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Find a user's preference
    async fn find(&self, user_id: i64) -> RepoResult<Option<UserNotificationPreference>>;

    /// Insert unless a row already exists; concurrent inserts leave one row
    async fn insert_if_absent(&self, preference: &UserNotificationPreference) -> RepoResult<()>;

    /// Overwrite an existing preference
    async fn update(&self, preference: &UserNotificationPreference) -> RepoResult<()>;
}

// ============================================================================
// In-App Notification Repository
// ============================================================================

#[async_trait]
pub trait InAppNotificationRepository: Send + Sync {
    /// Create the row for a queue entry, or refresh it if a retry already wrote one
    async fn upsert_for_entry(&self, notification: &InAppNotification) -> RepoResult<i64>;

    /// Latest non-expired notifications for a user
    async fn list_for_user(
        &self,
        user_id: i64,
        unread_only: bool,
        now: DateTime<Utc>,
        limit: i64,
    ) -> RepoResult<Vec<InAppNotification>>;

    /// Mark one of the user's notifications read
    async fn mark_read(
        &self,
        id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<InAppNotification>>;

    /// Pin or unpin one of the user's notifications
    async fn set_pinned(
        &self,
        id: i64,
        user_id: i64,
        pinned: bool,
    ) -> RepoResult<Option<InAppNotification>>;

    /// Delete read, unpinned notifications created before `cutoff`
    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> RepoResult<u64>;

    /// Delete notifications whose expiry has passed
    async fn delete_expired(&self, now: DateTime<Utc>) -> RepoResult<u64>;
}

// ============================================================================
// Template Repository
// ============================================================================

#[async_trait]
pub trait NotificationTemplateRepository: Send + Sync {
    /// Find the template for a key and channel
    async fn find(&self, template_key: &str, channel: &str)
        -> RepoResult<Option<NotificationTemplate>>;
}

// ============================================================================
// Delivery Stats Repository
// ============================================================================

#[async_trait]
pub trait DeliveryStatsRepository: Send + Sync {
    /// Add the counters to the row for (day, template, channel)
    async fn record(&self, stat: &DeliveryStat) -> RepoResult<()>;

    /// All rows for one day
    async fn find_by_day(&self, day: NaiveDate) -> RepoResult<Vec<DeliveryStat>>;
}

// ============================================================================
// Support Event Repository
// ============================================================================

#[async_trait]
pub trait SupportEventRepository: Send + Sync {
    /// Insert a ticket and its opening log row in one transaction
    async fn create(&self, event: &SupportEvent) -> RepoResult<SupportEvent>;

    /// Find ticket by ID
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<SupportEvent>>;

    /// Log rows for a ticket, oldest first
    async fn find_logs(&self, event_id: i64) -> RepoResult<Vec<SupportEventLog>>;

    /// Persist a status change and its log row in one transaction.
    ///
    /// Fails with `ConcurrentModification` if the stored status is no longer
    /// `expected_status`.
    async fn apply_transition(
        &self,
        event: &SupportEvent,
        expected_status: SupportStatus,
        log: &SupportEventLog,
    ) -> RepoResult<()>;

    /// Store a rating; fails with `AlreadyRated` if one is already recorded
    async fn record_rating(&self, event: &SupportEvent) -> RepoResult<()>;
}

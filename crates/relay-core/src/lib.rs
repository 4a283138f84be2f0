//! # relay-core
//!
//! Domain layer containing entities, the support ticket lifecycle, notification
//! preference rules, repository traits, and domain events.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;

// Re-export commonly used types at crate root
pub use entities::{
    ActorRole, ChannelOverride, ChannelToggles, ClosingFeedback, CredentialScheme, DeliveryStat,
    InAppNotification, Message, NotificationChannel, NotificationEventType,
    NotificationQueueEntry, NotificationTemplate, PreferenceUpdate, Principal, QueueStatus,
    ReadCursor, RenderedNotification, Room, RoomKind, SupportEvent, SupportEventDetail,
    SupportEventLog, SupportStatus, UnreadSnapshot, UserNotificationPreference,
};
pub use error::DomainError;
pub use events::{TicketEvent, TicketEventKind};
pub use traits::{
    DeliveryStatsRepository, InAppNotificationRepository, LockToken, MessageRepository,
    NotificationQueueRepository, NotificationTemplateRepository, NullBroadcaster,
    PreferenceRepository, ReadCursorRepository, RepoResult, RoomRepository, RunLock,
    SupportEventRepository, TicketBroadcaster,
};

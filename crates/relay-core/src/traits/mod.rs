//! Ports implemented by the infrastructure crates

mod broadcast;
mod lock;
mod repositories;

pub use broadcast::{NullBroadcaster, TicketBroadcaster};
pub use lock::{LockToken, RunLock};
pub use repositories::{
    DeliveryStatsRepository, InAppNotificationRepository, MessageRepository,
    NotificationQueueRepository, NotificationTemplateRepository, PreferenceRepository,
    ReadCursorRepository, RepoResult, RoomRepository, SupportEventRepository,
};

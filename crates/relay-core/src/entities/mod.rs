//! Domain entities - core business objects

mod message;
mod notification;
mod preference;
mod principal;
mod room;
mod support;

pub use message::{Message, ReadCursor, UnreadSnapshot, MAX_MESSAGE_LENGTH};
pub use notification::{
    render_placeholders, ChannelToggles, DeliveryStat, InAppNotification, NotificationChannel,
    NotificationEventType, NotificationQueueEntry, NotificationTemplate, QueueStatus,
    RenderedNotification, SUPPRESSED_CHANNEL_DISABLED, SUPPRESSED_PREFIX, SUPPRESSED_QUIET_HOURS,
};
pub use preference::{
    parse_clock_time, ChannelOverride, PreferenceUpdate, UserNotificationPreference,
    MAX_UTC_OFFSET_MINUTES, MIN_UTC_OFFSET_MINUTES,
};
pub use principal::{CredentialScheme, Principal};
pub use room::{Room, RoomKind};
pub use support::{
    allowed_transitions, check_transition, validate_rating, ActorRole, ClosingFeedback,
    SupportEvent, SupportEventDetail, SupportEventLog, SupportStatus, MAX_REVIEW_LENGTH,
    TRANSITIONS,
};

//! Repository implementations - PostgreSQL implementations of repository traits

mod delivery_stats;
mod error;
mod in_app;
mod message;
mod notification_queue;
mod preference;
mod read_cursor;
mod room;
mod support_event;
mod template;

pub use delivery_stats::PgDeliveryStatsRepository;
pub use error::{map_db_error, map_unique_violation};
pub use in_app::PgInAppNotificationRepository;
pub use message::PgMessageRepository;
pub use notification_queue::PgNotificationQueueRepository;
pub use preference::PgPreferenceRepository;
pub use read_cursor::PgReadCursorRepository;
pub use room::PgRoomRepository;
pub use support_event::PgSupportEventRepository;
pub use template::PgNotificationTemplateRepository;

//! Database models - SQLx-compatible structs for PostgreSQL tables

mod message;
mod notification;
mod preference;
mod room;
mod support;

pub use message::{MessageModel, ReadCursorModel, UnreadCountModel};
pub use notification::{
    DeliveryStatModel, InAppNotificationModel, NotificationQueueModel, NotificationTemplateModel,
};
pub use preference::PreferenceModel;
pub use room::RoomModel;
pub use support::{SupportEventLogModel, SupportEventModel};

//! Message and ReadCursor entity <-> model mapper

use relay_core::{Message, ReadCursor};

use crate::models::{MessageModel, ReadCursorModel};

/// Convert MessageModel to Message entity
impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        Message {
            id: model.id,
            room_id: model.room_id,
            sender_id: model.sender_id,
            body: model.body,
            sent_at: model.sent_at,
        }
    }
}

/// Convert ReadCursorModel to ReadCursor entity
impl From<ReadCursorModel> for ReadCursor {
    fn from(model: ReadCursorModel) -> Self {
        ReadCursor {
            user_id: model.user_id,
            room_id: model.room_id,
            last_read_message_id: model.last_read_message_id,
            updated_at: model.updated_at,
        }
    }
}

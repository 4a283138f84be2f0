//! Client frame payloads

use serde::{Deserialize, Serialize};

/// `authenticate` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatePayload {
    pub token: String,
}

/// Payload naming a single room (`join_room`, `leave_room`, `read_room`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPayload {
    pub room_id: i64,
}

/// `send_message` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessagePayload {
    pub room_id: i64,
    /// Id of the stored message; the room's latest id when omitted
    #[serde(default)]
    pub message_id: Option<i64>,
    pub text: String,
    /// Users whose unread counts change; the room's members when omitted
    #[serde(default)]
    pub to_user_ids: Option<Vec<i64>>,
}

/// `typing` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingPayload {
    pub room_id: i64,
    pub is_typing: bool,
}

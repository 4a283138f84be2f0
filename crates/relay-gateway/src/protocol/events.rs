//! Gateway frame format
//!
//! Client frames are decoded in two steps: the envelope first, then the
//! payload for the named event. That keeps the event name available for
//! error replies even when its payload is bad.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use relay_core::events::TicketEvent;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::payloads::{AuthenticatePayload, RoomPayload, SendMessagePayload, TypingPayload};

/// Why a client frame could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Frame is not a JSON event envelope: {0}")]
    Malformed(String),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Invalid {event} payload: {reason}")]
    InvalidPayload { event: String, reason: String },
}

impl FrameError {
    /// Event name the frame carried, if any
    pub fn event(&self) -> Option<&str> {
        match self {
            Self::Malformed(_) => None,
            Self::UnknownEvent(event) | Self::InvalidPayload { event, .. } => Some(event),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Frames a client may send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Authenticate(AuthenticatePayload),
    JoinRoom(RoomPayload),
    LeaveRoom(RoomPayload),
    SendMessage(SendMessagePayload),
    Typing(TypingPayload),
    ReadRoom(RoomPayload),
    Ping,
}

impl ClientEvent {
    /// Decode a text frame
    pub fn from_json(text: &str) -> Result<Self, FrameError> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| FrameError::Malformed(e.to_string()))?;
        let Envelope { event, data } = envelope;

        fn payload<T: serde::de::DeserializeOwned>(
            event: &str,
            data: Value,
        ) -> Result<T, FrameError> {
            serde_json::from_value(data).map_err(|e| FrameError::InvalidPayload {
                event: event.to_string(),
                reason: e.to_string(),
            })
        }

        match event.as_str() {
            "authenticate" => payload(&event, data).map(Self::Authenticate),
            "join_room" => payload(&event, data).map(Self::JoinRoom),
            "leave_room" => payload(&event, data).map(Self::LeaveRoom),
            "send_message" => payload(&event, data).map(Self::SendMessage),
            "typing" => payload(&event, data).map(Self::Typing),
            "read_room" => payload(&event, data).map(Self::ReadRoom),
            "ping" => Ok(Self::Ping),
            _ => Err(FrameError::UnknownEvent(event)),
        }
    }

    /// Event name on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authenticate(_) => "authenticate",
            Self::JoinRoom(_) => "join_room",
            Self::LeaveRoom(_) => "leave_room",
            Self::SendMessage(_) => "send_message",
            Self::Typing(_) => "typing",
            Self::ReadRoom(_) => "read_room",
            Self::Ping => "ping",
        }
    }
}

/// Frame sent to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEvent {
    pub event: String,
    pub data: Value,
}

impl ServerEvent {
    fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Sent once authentication succeeds
    #[must_use]
    pub fn ready(user_id: i64, session_id: &str, store_available: bool) -> Self {
        let store = if store_available {
            "connected"
        } else {
            "unavailable"
        };
        Self::new(
            "ready",
            json!({"user_id": user_id, "session_id": session_id, "store": store}),
        )
    }

    /// A relayed chat message
    #[must_use]
    pub fn message(
        room_id: i64,
        message_id: Option<i64>,
        text: &str,
        from_user_id: i64,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            "message",
            json!({
                "room_id": room_id,
                "message_id": message_id,
                "text": text,
                "from_user_id": from_user_id,
                "sent_at": sent_at,
            }),
        )
    }

    #[must_use]
    pub fn typing(room_id: i64, from_user_id: i64, is_typing: bool) -> Self {
        Self::new(
            "typing",
            json!({"room_id": room_id, "from_user_id": from_user_id, "is_typing": is_typing}),
        )
    }

    #[must_use]
    pub fn unread_total(total: i64) -> Self {
        Self::new("unread_total", json!({"total": total}))
    }

    /// Per-room unread counts; JSON object keys are the room ids
    #[must_use]
    pub fn unread_by_room(by_room: &BTreeMap<i64, i64>) -> Self {
        let by_room: serde_json::Map<String, Value> = by_room
            .iter()
            .map(|(room_id, count)| (room_id.to_string(), Value::from(*count)))
            .collect();
        Self::new("unread_by_room", json!({"by_room": by_room}))
    }

    /// A support ticket change
    #[must_use]
    pub fn ticket(event: &TicketEvent) -> Self {
        Self::new(
            event.kind.name(),
            json!({
                "chat_room_id": event.chat_room_id,
                "event": event.event,
                "timestamp": event.timestamp,
            }),
        )
    }

    /// A rejected operation
    #[must_use]
    pub fn error(code: &str, message: &str, event: Option<&str>) -> Self {
        let mut data = json!({"code": code, "message": message});
        if let Some(event) = event {
            data["event"] = Value::from(event);
        }
        Self::new("error", data)
    }

    #[must_use]
    pub fn pong() -> Self {
        Self::new("pong", json!({}))
    }

    /// Serialize to a text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use relay_core::entities::{Room, RoomKind, SupportEvent, SupportEventDetail};
    use relay_core::events::TicketEventKind;

    use super::*;

    #[test]
    fn test_parse_client_events() {
        let event = ClientEvent::from_json(r#"{"event":"join_room","data":{"room_id":7}}"#).unwrap();
        assert_eq!(event, ClientEvent::JoinRoom(RoomPayload { room_id: 7 }));

        let event = ClientEvent::from_json(
            r#"{"event":"send_message","data":{"room_id":7,"text":"hi","to_user_ids":[2]}}"#,
        )
        .unwrap();
        let ClientEvent::SendMessage(payload) = event else {
            panic!("expected send_message");
        };
        assert_eq!(payload.message_id, None);
        assert_eq!(payload.to_user_ids, Some(vec![2]));

        assert_eq!(ClientEvent::from_json(r#"{"event":"ping"}"#).unwrap(), ClientEvent::Ping);
    }

    #[test]
    fn test_parse_errors_keep_event_name() {
        let err = ClientEvent::from_json("not json").unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
        assert_eq!(err.event(), None);

        let err = ClientEvent::from_json(r#"{"event":"dance","data":{}}"#).unwrap_err();
        assert_eq!(err, FrameError::UnknownEvent("dance".into()));

        let err = ClientEvent::from_json(r#"{"event":"typing","data":{"room_id":"x"}}"#)
            .unwrap_err();
        assert_eq!(err.event(), Some("typing"));
    }

    #[test]
    fn test_server_event_shapes() {
        let mut by_room = BTreeMap::new();
        by_room.insert(7, 2);
        let value = serde_json::to_value(ServerEvent::unread_by_room(&by_room)).unwrap();
        assert_eq!(value, json!({"event": "unread_by_room", "data": {"by_room": {"7": 2}}}));

        let value = serde_json::to_value(ServerEvent::error("X", "bad", Some("typing"))).unwrap();
        assert_eq!(value["data"]["event"], "typing");
        let value = serde_json::to_value(ServerEvent::error("X", "bad", None)).unwrap();
        assert!(value["data"].get("event").is_none());

        let ready = serde_json::to_value(ServerEvent::ready(4, "abc", false)).unwrap();
        assert_eq!(ready["data"]["store"], "unavailable");
    }

    #[test]
    fn test_ticket_event_frame() {
        let room = Room {
            id: 7,
            ..Room::new(RoomKind::Support, 1, 9)
        };
        let detail = SupportEventDetail {
            event: SupportEvent::open(&room, Utc::now()),
            logs: Vec::new(),
        };
        let frame = ServerEvent::ticket(&TicketEvent::new(TicketEventKind::Closed, detail));
        assert_eq!(frame.event, "event:closed");
        assert_eq!(frame.data["chat_room_id"], 7);
        assert_eq!(frame.data["event"]["status"], "open");
    }
}

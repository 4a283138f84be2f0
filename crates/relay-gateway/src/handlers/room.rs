//! Room membership and typing handlers

use std::sync::Arc;

use crate::connection::Connection;
use crate::protocol::{ServerEvent, TypingPayload};
use crate::server::GatewayState;

/// Handles `join_room`, `leave_room`, and `typing`
pub struct RoomHandler;

impl RoomHandler {
    /// Join a room's broadcast group. No membership check is made.
    pub fn join(state: &GatewayState, connection: &Arc<Connection>, room_id: i64) {
        state.registry().join_room(connection.session_id(), room_id);
    }

    /// Leave a room's broadcast group; no-op when not joined
    pub fn leave(state: &GatewayState, connection: &Arc<Connection>, room_id: i64) {
        state.registry().leave_room(connection.session_id(), room_id);
    }

    /// Relay a typing indicator to the rest of the room
    pub fn typing(state: &GatewayState, user_id: i64, payload: &TypingPayload) {
        let event = ServerEvent::typing(payload.room_id, user_id, payload.is_typing);
        state
            .registry()
            .send_to_room(payload.room_id, &event, Some(user_id));
    }
}

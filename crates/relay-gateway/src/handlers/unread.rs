//! Read cursor and unread count handlers

use relay_core::entities::UnreadSnapshot;
use relay_service::UnreadService;

use super::HandlerResult;
use crate::protocol::ServerEvent;
use crate::server::GatewayState;

/// Handles `read_room` and unread pushes
pub struct UnreadHandler;

impl UnreadHandler {
    /// Current snapshot, or `None` when the store cannot answer
    pub async fn snapshot(state: &GatewayState, user_id: i64) -> Option<UnreadSnapshot> {
        let result = UnreadService::new(state.service_context()).snapshot(user_id).await;
        state.health().observe("unread_snapshot", result)
    }

    /// The `unread_by_room` and `unread_total` frames for a snapshot
    pub fn snapshot_events(snapshot: &UnreadSnapshot) -> [ServerEvent; 2] {
        [
            ServerEvent::unread_by_room(&snapshot.by_room),
            ServerEvent::unread_total(snapshot.total),
        ]
    }

    /// Recompute a user's counts and push them to the personal channel
    pub async fn push(state: &GatewayState, user_id: i64) {
        if let Some(snapshot) = Self::snapshot(state, user_id).await {
            Self::send_snapshot(state, user_id, &snapshot);
        }
    }

    fn send_snapshot(state: &GatewayState, user_id: i64, snapshot: &UnreadSnapshot) {
        for event in Self::snapshot_events(snapshot) {
            state.registry().send_to_user(user_id, &event);
        }
    }

    /// Move the caller's cursor to the room's latest message, then push counts.
    ///
    /// Unlike relays, a read that the store cannot serve is reported back to
    /// the caller as an error.
    pub async fn read_room(state: &GatewayState, user_id: i64, room_id: i64) -> HandlerResult<()> {
        let unread = UnreadService::new(state.service_context());
        state
            .health()
            .record("mark_room_read", unread.mark_room_read(user_id, room_id).await)?;
        let snapshot = state
            .health()
            .record("unread_snapshot", unread.snapshot(user_id).await)?;
        Self::send_snapshot(state, user_id, &snapshot);
        Ok(())
    }
}

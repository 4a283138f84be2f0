//! Individual WebSocket connection
//!
//! Represents a single WebSocket connection and its state.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::protocol::{CloseCode, ServerEvent};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Socket open, no credential accepted yet
    Connecting,
    /// Bound to a user
    Authenticated,
    /// Connection is closed
    Disconnected,
}

/// Item queued for the socket writer
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Event(ServerEvent),
    /// Send a close frame and stop writing
    Close(CloseCode),
}

/// A single WebSocket connection
pub struct Connection {
    /// Unique session ID
    session_id: String,

    /// Authenticated user ID (None until authenticated)
    user_id: RwLock<Option<i64>>,

    /// Current connection state
    state: RwLock<ConnectionState>,

    /// Channel to the socket writer
    sender: mpsc::Sender<Outbound>,

    /// Rooms this connection has joined
    rooms: RwLock<HashSet<i64>>,
}

impl Connection {
    /// Create a new connection
    pub fn new(session_id: String, sender: mpsc::Sender<Outbound>) -> Arc<Self> {
        Arc::new(Self {
            session_id,
            user_id: RwLock::new(None),
            state: RwLock::new(ConnectionState::Connecting),
            sender,
            rooms: RwLock::new(HashSet::new()),
        })
    }

    /// Get the session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get the user ID (if authenticated)
    pub fn user_id(&self) -> Option<i64> {
        *self.user_id.read()
    }

    /// Bind the connection to a user
    pub fn authenticate(&self, user_id: i64) {
        *self.user_id.write() = Some(user_id);
        *self.state.write() = ConnectionState::Authenticated;
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Set the connection state
    pub fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }

    /// Check if the connection is authenticated
    pub fn is_authenticated(&self) -> bool {
        self.user_id.read().is_some()
    }

    /// Record a joined room; returns false if it was already joined
    pub fn join_room(&self, room_id: i64) -> bool {
        self.rooms.write().insert(room_id)
    }

    /// Forget a room; returns false if it was not joined
    pub fn leave_room(&self, room_id: i64) -> bool {
        self.rooms.write().remove(&room_id)
    }

    /// Get all joined rooms
    pub fn rooms(&self) -> Vec<i64> {
        self.rooms.read().iter().copied().collect()
    }

    /// Check if the connection has joined a room
    pub fn in_room(&self, room_id: i64) -> bool {
        self.rooms.read().contains(&room_id)
    }

    /// Queue an event, waiting for buffer space
    pub async fn send(&self, event: ServerEvent) -> Result<(), mpsc::error::SendError<Outbound>> {
        self.sender.send(Outbound::Event(event)).await
    }

    /// Queue an event without waiting; fails when the buffer is full
    pub fn try_send(&self, event: ServerEvent) -> Result<(), mpsc::error::TrySendError<Outbound>> {
        self.sender.try_send(Outbound::Event(event))
    }

    /// Ask the writer to close the socket after the frames already queued.
    ///
    /// With a full buffer the writer still stops once every sender is gone,
    /// just without a close code.
    pub fn close(&self, code: CloseCode) {
        if let Err(e) = self.sender.try_send(Outbound::Close(code)) {
            tracing::trace!(session_id = %self.session_id, error = %e, "Close not queued");
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id())
            .field("state", &self.state())
            .finish()
    }
}

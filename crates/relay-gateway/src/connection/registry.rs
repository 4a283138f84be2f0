//! Connection registry
//!
//! Indexes live connections by session, by user (the personal channel), and
//! by room (the broadcast group). Owned by the gateway state, one per server.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::{Connection, ConnectionState, Outbound};
use crate::protocol::ServerEvent;

/// Registry of all live WebSocket connections
pub struct ConnectionRegistry {
    /// Active connections by session ID
    connections: DashMap<String, Arc<Connection>>,

    /// User ID to session IDs mapping
    user_connections: DashMap<i64, HashSet<String>>,

    /// Room ID to session IDs mapping
    room_connections: DashMap<i64, HashSet<String>>,
}

fn detach(index: &DashMap<i64, HashSet<String>>, key: i64, session_id: &str) {
    if let Some(mut sessions) = index.get_mut(&key) {
        sessions.remove(session_id);
    }
    index.remove_if(&key, |_, sessions| sessions.is_empty());
}

impl ConnectionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_connections: DashMap::new(),
            room_connections: DashMap::new(),
        }
    }

    /// Create an empty registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new, unauthenticated connection
    pub fn add_connection(
        &self,
        session_id: String,
        sender: mpsc::Sender<Outbound>,
    ) -> Arc<Connection> {
        let connection = Connection::new(session_id.clone(), sender);
        self.connections.insert(session_id.clone(), connection.clone());

        tracing::debug!(session_id = %session_id, "Connection added");

        connection
    }

    /// Remove a connection and every index entry pointing at it
    pub fn remove_connection(&self, session_id: &str) {
        let Some((_, connection)) = self.connections.remove(session_id) else {
            return;
        };
        connection.set_state(ConnectionState::Disconnected);

        if let Some(user_id) = connection.user_id() {
            detach(&self.user_connections, user_id, session_id);
        }
        for room_id in connection.rooms() {
            detach(&self.room_connections, room_id, session_id);
        }

        tracing::debug!(session_id = %session_id, "Connection removed");
    }

    /// Get a connection by session ID
    pub fn get_connection(&self, session_id: &str) -> Option<Arc<Connection>> {
        self.connections.get(session_id).map(|r| r.clone())
    }

    /// Bind a connection to a user and join it to the user's personal channel
    pub fn authenticate_connection(&self, session_id: &str, user_id: i64) -> bool {
        let Some(connection) = self.get_connection(session_id) else {
            return false;
        };
        connection.authenticate(user_id);
        self.user_connections
            .entry(user_id)
            .or_default()
            .insert(session_id.to_string());

        tracing::debug!(session_id = %session_id, user_id, "Connection authenticated");
        true
    }

    /// Add a connection to a room's broadcast group; idempotent
    pub fn join_room(&self, session_id: &str, room_id: i64) -> bool {
        let Some(connection) = self.get_connection(session_id) else {
            return false;
        };
        connection.join_room(room_id);
        self.room_connections
            .entry(room_id)
            .or_default()
            .insert(session_id.to_string());

        tracing::trace!(session_id = %session_id, room_id, "Joined room");
        true
    }

    /// Remove a connection from a room's broadcast group; idempotent
    pub fn leave_room(&self, session_id: &str, room_id: i64) -> bool {
        let Some(connection) = self.get_connection(session_id) else {
            return false;
        };
        connection.leave_room(room_id);
        detach(&self.room_connections, room_id, session_id);

        tracing::trace!(session_id = %session_id, room_id, "Left room");
        true
    }

    fn resolve(&self, index: &DashMap<i64, HashSet<String>>, key: i64) -> Vec<Arc<Connection>> {
        let sessions: Vec<String> = index
            .get(&key)
            .map(|sessions| sessions.iter().cloned().collect())
            .unwrap_or_default();
        sessions
            .iter()
            .filter_map(|sid| self.get_connection(sid))
            .collect()
    }

    /// All connections of a user
    pub fn user_connections(&self, user_id: i64) -> Vec<Arc<Connection>> {
        self.resolve(&self.user_connections, user_id)
    }

    /// All connections in a room's broadcast group
    pub fn room_connections(&self, room_id: i64) -> Vec<Arc<Connection>> {
        self.resolve(&self.room_connections, room_id)
    }

    /// Queue an event on each connection without waiting.
    ///
    /// A connection whose buffer is full misses the event; the caller and
    /// every other recipient carry on.
    fn fan_out<'a>(
        connections: impl IntoIterator<Item = &'a Arc<Connection>>,
        event: &ServerEvent,
    ) -> usize {
        let mut sent = 0;
        for conn in connections {
            match conn.try_send(event.clone()) {
                Ok(()) => sent += 1,
                Err(mpsc::error::TrySendError::Full(_)) => tracing::warn!(
                    session_id = %conn.session_id(),
                    event = %event.event,
                    "Dropped event for slow connection"
                ),
                Err(mpsc::error::TrySendError::Closed(_)) => tracing::trace!(
                    session_id = %conn.session_id(),
                    "Connection writer already gone"
                ),
            }
        }
        sent
    }

    /// Send to every connection of a user
    pub fn send_to_user(&self, user_id: i64, event: &ServerEvent) -> usize {
        let sent = Self::fan_out(&self.user_connections(user_id), event);

        tracing::trace!(user_id, sent, "Event sent to user connections");
        sent
    }

    /// Send to a room's broadcast group, skipping every connection of `exclude_user`
    pub fn send_to_room(&self, room_id: i64, event: &ServerEvent, exclude_user: Option<i64>) -> usize {
        let recipients: Vec<_> = self
            .room_connections(room_id)
            .into_iter()
            .filter(|conn| exclude_user.is_none() || conn.user_id() != exclude_user)
            .collect();
        let sent = Self::fan_out(&recipients, event);

        tracing::trace!(room_id, sent, "Event sent to room connections");
        sent
    }

    /// Get the total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of unique authenticated users
    pub fn user_count(&self) -> usize {
        self.user_connections.len()
    }

    /// Get the number of rooms with at least one connection
    pub fn room_count(&self) -> usize {
        self.room_connections.len()
    }

    /// Check if a session exists
    pub fn has_session(&self, session_id: &str) -> bool {
        self.connections.contains_key(session_id)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.len())
            .field("users", &self.user_connections.len())
            .field("rooms", &self.room_connections.len())
            .finish()
    }
}

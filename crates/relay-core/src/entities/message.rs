//! Message and read cursor entities

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum characters accepted in a relayed message body
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Message entity
///
/// Messages are appended by the chat producers; ids grow monotonically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub room_id: i64,
    pub sender_id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Get a truncated preview of the message (for notifications)
    pub fn preview(&self, max_len: usize) -> &str {
        if self.body.len() <= max_len {
            &self.body
        } else {
            let mut end = max_len;
            while !self.body.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.body[..end]
        }
    }
}

/// Last message a user has acknowledged in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCursor {
    pub user_id: i64,
    pub room_id: i64,
    pub last_read_message_id: i64,
    pub updated_at: DateTime<Utc>,
}

impl ReadCursor {
    pub fn new(user_id: i64, room_id: i64, last_read_message_id: i64) -> Self {
        Self {
            user_id,
            room_id,
            last_read_message_id,
            updated_at: Utc::now(),
        }
    }

    /// Move the cursor forward. Never moves backward.
    ///
    /// Returns `true` if the stored position changed.
    pub fn advance(&mut self, message_id: i64) -> bool {
        if message_id > self.last_read_message_id {
            self.last_read_message_id = message_id;
            self.updated_at = Utc::now();
            true
        } else {
            false
        }
    }
}

/// Unread counts for one user, derived from messages and read cursors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadSnapshot {
    pub total: i64,
    pub by_room: BTreeMap<i64, i64>,
}

impl UnreadSnapshot {
    /// Build a snapshot from per-room counts; negative counts are floored at 0
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (i64, i64)>,
    {
        let by_room: BTreeMap<i64, i64> = counts
            .into_iter()
            .map(|(room_id, count)| (room_id, count.max(0)))
            .collect();
        let total = by_room.values().sum();
        Self { total, by_room }
    }

    /// Unread count for a single room
    pub fn room(&self, room_id: i64) -> i64 {
        self.by_room.get(&room_id).copied().unwrap_or(0)
    }
}

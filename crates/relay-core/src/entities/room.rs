//! Room entity - a two-party conversation

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Room kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    /// Ordinary chat between two users
    #[default]
    Chat,
    /// Conversation backing a support ticket
    Support,
}

impl RoomKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Support => "support",
        }
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Self::Chat),
            "support" => Ok(Self::Support),
            other => Err(DomainError::ValidationError(format!("unknown room kind: {other}"))),
        }
    }
}

/// Room entity
///
/// Membership is fixed at creation: the creator and one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub kind: RoomKind,
    pub creator_id: i64,
    pub participant_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Create a new Room (id is assigned by the store)
    pub fn new(kind: RoomKind, creator_id: i64, participant_id: i64) -> Self {
        Self {
            id: 0,
            kind,
            creator_id,
            participant_id,
            created_at: Utc::now(),
        }
    }

    /// Both members of the room
    #[inline]
    pub fn members(&self) -> [i64; 2] {
        [self.creator_id, self.participant_id]
    }

    /// Check if a user is one of the two members
    #[inline]
    pub fn is_member(&self, user_id: i64) -> bool {
        self.creator_id == user_id || self.participant_id == user_id
    }

    /// The member that is not `user_id`, if `user_id` is a member
    pub fn counterpart(&self, user_id: i64) -> Option<i64> {
        if self.creator_id == user_id {
            Some(self.participant_id)
        } else if self.participant_id == user_id {
            Some(self.creator_id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let room = Room::new(RoomKind::Chat, 1, 2);
        assert!(room.is_member(1));
        assert!(room.is_member(2));
        assert!(!room.is_member(3));
        assert_eq!(room.members(), [1, 2]);
    }

    #[test]
    fn test_counterpart() {
        let room = Room::new(RoomKind::Support, 10, 20);
        assert_eq!(room.counterpart(10), Some(20));
        assert_eq!(room.counterpart(20), Some(10));
        assert_eq!(room.counterpart(30), None);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("support".parse::<RoomKind>().unwrap(), RoomKind::Support);
        assert!("guild".parse::<RoomKind>().is_err());
    }
}

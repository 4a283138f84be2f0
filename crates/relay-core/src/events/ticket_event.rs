//! Ticket events - pushed to everyone watching the ticket's room

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{SupportEventDetail, SupportStatus};

/// What happened to the ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketEventKind {
    #[serde(rename = "event:new")]
    New,
    #[serde(rename = "event:update")]
    Update,
    #[serde(rename = "event:closed")]
    Closed,
    #[serde(rename = "event:rated")]
    Rated,
}

impl TicketEventKind {
    /// Event name on the wire
    pub fn name(self) -> &'static str {
        match self {
            Self::New => "event:new",
            Self::Update => "event:update",
            Self::Closed => "event:closed",
            Self::Rated => "event:rated",
        }
    }

    /// Kind for a status change landing on `status`
    pub fn for_status(status: SupportStatus) -> Self {
        if status.is_terminal() {
            Self::Closed
        } else {
            Self::Update
        }
    }
}

/// A ticket change ready for broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketEvent {
    pub kind: TicketEventKind,
    pub chat_room_id: i64,
    pub event: SupportEventDetail,
    pub timestamp: DateTime<Utc>,
}

impl TicketEvent {
    pub fn new(kind: TicketEventKind, detail: SupportEventDetail) -> Self {
        Self {
            kind,
            chat_room_id: detail.event.chat_room_id,
            event: detail,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_status() {
        assert_eq!(TicketEventKind::for_status(SupportStatus::Resolved), TicketEventKind::Update);
        assert_eq!(
            TicketEventKind::for_status(SupportStatus::ClosedByCustomer),
            TicketEventKind::Closed
        );
        assert_eq!(TicketEventKind::Rated.name(), "event:rated");
    }
}

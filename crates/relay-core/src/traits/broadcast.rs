//! Ticket broadcast port

use crate::events::TicketEvent;

/// Delivers ticket events to connections subscribed to the ticket's room
pub trait TicketBroadcaster: Send + Sync {
    /// Returns how many connections the event was queued for
    fn broadcast_ticket(&self, event: &TicketEvent) -> usize;
}

/// Broadcaster for processes without a gateway
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBroadcaster;

impl TicketBroadcaster for NullBroadcaster {
    fn broadcast_ticket(&self, _event: &TicketEvent) -> usize {
        0
    }
}

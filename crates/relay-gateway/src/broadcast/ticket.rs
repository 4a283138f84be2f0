//! Ticket broadcaster backed by the connection registry

use std::sync::Arc;

use relay_core::events::TicketEvent;
use relay_core::traits::TicketBroadcaster;

use crate::connection::ConnectionRegistry;
use crate::protocol::ServerEvent;

/// Sends ticket events to every connection that joined the ticket's room
#[derive(Debug, Clone)]
pub struct GatewayBroadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl GatewayBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

impl TicketBroadcaster for GatewayBroadcaster {
    fn broadcast_ticket(&self, event: &TicketEvent) -> usize {
        let frame = ServerEvent::ticket(event);
        let sent = self.registry.send_to_room(event.chat_room_id, &frame, None);

        tracing::debug!(
            event = event.kind.name(),
            room_id = event.chat_room_id,
            sent,
            "Ticket event dispatched"
        );
        sent
    }
}

//! Domain events emitted when ticket state changes

mod ticket_event;

pub use ticket_event::{TicketEvent, TicketEventKind};

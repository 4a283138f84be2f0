//! Event broadcasting
//!
//! Pushes ticket events from the service layer to room broadcast groups.

mod ticket;

pub use ticket::GatewayBroadcaster;

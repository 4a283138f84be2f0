//! # relay-gateway
//!
//! WebSocket gateway: room broadcast groups, typing indicators, read cursors,
//! live unread counts, and support ticket events.

pub mod broadcast;
pub mod connection;
pub mod handlers;
pub mod health;
pub mod protocol;
pub mod server;

pub use broadcast::GatewayBroadcaster;
pub use connection::ConnectionRegistry;
pub use health::StoreHealth;
pub use server::{create_gateway_state, create_router, GatewayState};

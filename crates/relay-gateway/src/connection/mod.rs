//! Connection management
//!
//! Tracks live sockets, the user each belongs to, and the rooms each has joined.

mod connection;
mod registry;

pub use connection::{Connection, ConnectionState, Outbound};
pub use registry::ConnectionRegistry;

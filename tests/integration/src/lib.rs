//! End-to-end test utilities for the relay server
//!
//! Spawns the full router (REST plus gateway) on an ephemeral port backed by
//! the in-memory store, and drives it over real sockets.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;

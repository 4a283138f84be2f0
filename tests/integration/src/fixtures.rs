//! Test fixtures
//!
//! Users and rooms seeded into every test server.

use std::collections::HashMap;

use relay_common::AppConfig;
use relay_core::entities::{Room, RoomKind};

pub const SECRET: &str = "integration-secret";

pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;
pub const ADMIN: i64 = 9;

/// Chat room shared by Alice and Bob
pub const CHAT_ROOM: i64 = 7;

/// Support room opened by Alice with the admin
pub const SUPPORT_ROOM: i64 = 8;

pub fn chat_room() -> Room {
    Room {
        id: CHAT_ROOM,
        ..Room::new(RoomKind::Chat, ALICE, BOB)
    }
}

pub fn support_room() -> Room {
    Room {
        id: SUPPORT_ROOM,
        ..Room::new(RoomKind::Support, ALICE, ADMIN)
    }
}

/// Configuration with only the required variables set
pub fn test_config() -> anyhow::Result<AppConfig> {
    let vars: HashMap<String, String> = [
        ("API_HOST", "127.0.0.1"),
        ("API_PORT", "0"),
        ("DATABASE_URL", "postgres://unused"),
        ("JWT_SECRET", SECRET),
        ("GATEWAY_HANDSHAKE_TIMEOUT_SECS", "2"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    Ok(AppConfig::from_map(&vars)?)
}

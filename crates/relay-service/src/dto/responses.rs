//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use relay_core::{CredentialScheme, Principal, UnreadSnapshot};
use serde::Serialize;

/// Unread counts for the caller
#[derive(Debug, Clone, Serialize)]
pub struct UnreadResponse {
    pub total: i64,
    pub by_room: BTreeMap<i64, i64>,
}

impl From<UnreadSnapshot> for UnreadResponse {
    fn from(snapshot: UnreadSnapshot) -> Self {
        Self {
            total: snapshot.total,
            by_room: snapshot.by_room,
        }
    }
}

/// The authenticated caller as resolved from their credential
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalResponse {
    pub user_id: i64,
    pub scheme: CredentialScheme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
}

impl From<Principal> for PrincipalResponse {
    fn from(principal: Principal) -> Self {
        Self {
            user_id: principal.user_id,
            scheme: principal.scheme,
            issued_at: principal.issued_at,
            expires_at: principal.expires_at,
            not_before: principal.not_before,
        }
    }
}

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Readiness response; the gateway keeps serving while the store is down
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub connections: usize,
    pub users: usize,
    pub rooms: usize,
}

//! Principal - the authenticated caller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credential scheme a principal was established with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialScheme {
    /// HMAC-signed claims token
    Signed,
    /// Unsigned encoded token kept for older clients
    Legacy,
}

/// Verified caller identity. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub not_before: Option<DateTime<Utc>>,
    pub scheme: CredentialScheme,
}

impl Principal {
    /// Check whether the principal is still inside its validity window
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at && self.not_before.map_or(true, |nbf| now >= nbf)
    }
}

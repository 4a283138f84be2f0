//! JWT issuing
//!
//! Produces signed tokens that `CredentialValidator` accepts.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use super::credential::{SignedClaims, Subject};
use crate::error::AppError;

/// JWT service for issuing signed tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    token_expiry: i64,
}

impl JwtService {
    /// Create a new JWT service with the given secret and default lifetime in seconds
    #[must_use]
    pub fn new(secret: &str, token_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            token_expiry,
        }
    }

    /// Default token lifetime in seconds
    pub fn token_expiry(&self) -> i64 {
        self.token_expiry
    }

    /// Issue a token for a user, valid from now for the default lifetime
    pub fn issue(&self, user_id: i64) -> Result<String, AppError> {
        self.issue_at(user_id, Utc::now(), self.token_expiry, None)
    }

    /// Issue a token with explicit issue time, lifetime, and not-before
    pub fn issue_at(
        &self,
        user_id: i64,
        issued_at: DateTime<Utc>,
        ttl_secs: i64,
        not_before: Option<DateTime<Utc>>,
    ) -> Result<String, AppError> {
        let claims = SignedClaims {
            sub: Some(Subject::Text(user_id.to_string())),
            iat: Some(issued_at.timestamp()),
            exp: Some((issued_at + Duration::seconds(ttl_secs)).timestamp()),
            nbf: not_before.map(|t| t.timestamp()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to encode JWT")))
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("token_expiry", &self.token_expiry)
            .finish_non_exhaustive()
    }
}

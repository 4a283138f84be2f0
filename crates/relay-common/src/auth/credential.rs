//! Credential validation
//!
//! Two token schemes are accepted while older clients migrate:
//!
//! - **Signed**: an HS256 JWT carrying `sub`, `iat`, `exp` and optionally `nbf`.
//! - **Legacy**: base64-encoded JSON carrying `user_id` (or `sub`) and `exp`,
//!   with no signature.
//!
//! A token is classified by shape before any verification: three
//! dot-separated segments is a JWT, anything else is tried as legacy.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use relay_core::{CredentialScheme, Principal};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a credential was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("Missing credential")]
    Missing,

    #[error("Malformed credential")]
    Malformed,

    #[error("Signature verification failed")]
    BadSignature,

    #[error("Unexpected signing algorithm")]
    AlgorithmMismatch,

    #[error("Missing claim: {0}")]
    MissingClaim(&'static str),

    #[error("Credential expired")]
    Expired,

    #[error("Credential not yet valid")]
    NotYetValid,

    #[error("Legacy credentials are no longer accepted")]
    LegacyDisabled,
}

impl CredentialError {
    /// Error code for API responses and gateway error events
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing => "MISSING_AUTH",
            Self::Expired => "TOKEN_EXPIRED",
            Self::NotYetValid => "TOKEN_NOT_YET_VALID",
            Self::LegacyDisabled => "LEGACY_TOKEN_DISABLED",
            Self::Malformed
            | Self::BadSignature
            | Self::AlgorithmMismatch
            | Self::MissingClaim(_) => "INVALID_TOKEN",
        }
    }
}

/// User id claim, issued as either a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Number(i64),
    Text(String),
}

impl Subject {
    fn user_id(&self) -> Option<i64> {
        let id = match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        };
        id.filter(|id| *id > 0)
    }
}

/// Claims of a signed token after signature verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedClaims {
    #[serde(default)]
    pub sub: Option<Subject>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// Fields of a legacy token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyClaims {
    pub user_id: i64,
    pub exp: i64,
}

impl LegacyClaims {
    /// Encode as a legacy token (standard base64, padded)
    pub fn encode(&self) -> String {
        let json = serde_json::json!({ "user_id": self.user_id, "exp": self.exp });
        STANDARD.encode(json.to_string())
    }
}

/// A structurally decoded credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Signed(SignedClaims),
    Legacy(LegacyClaims),
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, CredentialError> {
    DateTime::from_timestamp(secs, 0).ok_or(CredentialError::Malformed)
}

impl Credential {
    /// Check claims and validity window at `now`
    pub fn verify(self, now: DateTime<Utc>) -> Result<Principal, CredentialError> {
        match self {
            Self::Signed(claims) => {
                let user_id = claims
                    .sub
                    .as_ref()
                    .ok_or(CredentialError::MissingClaim("sub"))?
                    .user_id()
                    .ok_or(CredentialError::Malformed)?;
                let iat = claims.iat.ok_or(CredentialError::MissingClaim("iat"))?;
                let exp = claims.exp.ok_or(CredentialError::MissingClaim("exp"))?;

                let expires_at = timestamp(exp)?;
                if now >= expires_at {
                    return Err(CredentialError::Expired);
                }
                let not_before = claims.nbf.map(timestamp).transpose()?;
                if not_before.is_some_and(|nbf| now < nbf) {
                    return Err(CredentialError::NotYetValid);
                }

                Ok(Principal {
                    user_id,
                    issued_at: Some(timestamp(iat)?),
                    expires_at,
                    not_before,
                    scheme: CredentialScheme::Signed,
                })
            }
            Self::Legacy(claims) => {
                let expires_at = timestamp(claims.exp)?;
                if expires_at <= now {
                    return Err(CredentialError::Expired);
                }
                Ok(Principal {
                    user_id: claims.user_id,
                    issued_at: None,
                    expires_at,
                    not_before: None,
                    scheme: CredentialScheme::Legacy,
                })
            }
        }
    }
}

/// Validates caller credentials for the gateway and the HTTP surface
#[derive(Clone)]
pub struct CredentialValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    accept_legacy: bool,
}

impl CredentialValidator {
    /// Create a validator for tokens signed with `secret`
    pub fn new(secret: &str, accept_legacy: bool) -> Self {
        // Algorithm is pinned; the time and claim checks happen in `verify`
        // so they can be evaluated against an explicit clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            accept_legacy,
        }
    }

    /// Validate a token against the current time
    pub fn validate(&self, token: &str) -> Result<Principal, CredentialError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token against `now`
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, CredentialError> {
        self.decode(token)?.verify(now)
    }

    /// Classify and decode a token, verifying the signature of signed tokens
    pub fn decode(&self, token: &str) -> Result<Credential, CredentialError> {
        let token = token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        if token.is_empty() {
            return Err(CredentialError::Missing);
        }

        if token.split('.').count() == 3 {
            let data = decode::<SignedClaims>(token, &self.decoding_key, &self.validation)
                .map_err(|e| match e.kind() {
                    ErrorKind::InvalidSignature => CredentialError::BadSignature,
                    ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                        CredentialError::AlgorithmMismatch
                    }
                    _ => CredentialError::Malformed,
                })?;
            return Ok(Credential::Signed(data.claims));
        }

        if !self.accept_legacy {
            return Err(CredentialError::LegacyDisabled);
        }
        decode_legacy(token).map(Credential::Legacy)
    }
}

impl std::fmt::Debug for CredentialValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialValidator")
            .field("accept_legacy", &self.accept_legacy)
            .finish_non_exhaustive()
    }
}

fn decode_legacy(token: &str) -> Result<LegacyClaims, CredentialError> {
    let bytes = [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(token).ok())
        .ok_or(CredentialError::Malformed)?;

    let value: Value = serde_json::from_slice(&bytes).map_err(|_| CredentialError::Malformed)?;
    let obj = value.as_object().ok_or(CredentialError::Malformed)?;

    let subject = obj
        .get("user_id")
        .or_else(|| obj.get("sub"))
        .ok_or(CredentialError::MissingClaim("user_id"))?;
    let user_id = match subject {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|id| *id > 0)
    .ok_or(CredentialError::Malformed)?;

    let exp = obj.get("exp").ok_or(CredentialError::MissingClaim("exp"))?;
    let exp = exp
        .as_i64()
        .or_else(|| exp.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
        .ok_or(CredentialError::Malformed)?;

    Ok(LegacyClaims { user_id, exp })
}

//! Authentication utilities

mod credential;
mod jwt;

pub use credential::{
    Credential, CredentialError, CredentialValidator, LegacyClaims, SignedClaims, Subject,
};
pub use jwt::JwtService;

//! Axum extractors for request handling
//!
//! Custom extractors for authentication, validation, and parameters.

mod auth;
mod params;
mod validated;

pub use auth::AuthUser;
pub use params::{IdPath, QueryParams};
pub use validated::ValidatedJson;

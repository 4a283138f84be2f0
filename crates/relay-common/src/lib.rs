//! # relay-common
//!
//! Shared utilities including configuration, error handling, credential
//! validation, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{
    Credential, CredentialError, CredentialValidator, JwtService, LegacyClaims, SignedClaims,
};
pub use config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, DatabaseConfig, Environment, GatewayConfig,
    JwtConfig, NotifyConfig, RedisConfig, ServerConfig,
};
pub use error::{AppError, ErrorResponse};
pub use telemetry::{
    try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError,
};

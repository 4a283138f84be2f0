//! Application state
//!
//! Wraps the gateway state so REST handlers and sockets share one service
//! context and one connection registry.

use std::sync::Arc;

use axum::extract::FromRef;
use relay_common::{AppConfig, CredentialValidator};
use relay_gateway::{ConnectionRegistry, GatewayState, StoreHealth};
use relay_service::ServiceContext;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Gateway state holding the service context and registry
    gateway: GatewayState,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(gateway: GatewayState, config: AppConfig) -> Self {
        Self {
            gateway,
            config: Arc::new(config),
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        self.gateway.service_context()
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the credential validator shared with the gateway
    pub fn validator(&self) -> &CredentialValidator {
        self.gateway.validator()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        self.gateway.registry()
    }

    pub fn health(&self) -> &StoreHealth {
        self.gateway.health()
    }
}

impl FromRef<AppState> for GatewayState {
    fn from_ref(state: &AppState) -> Self {
        state.gateway.clone()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("gateway", &self.gateway)
            .field("config", &"AppConfig")
            .finish()
    }
}

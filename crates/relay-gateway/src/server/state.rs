//! Gateway state
//!
//! Shared dependencies for the WebSocket handlers.

use std::sync::Arc;

use relay_common::{CredentialValidator, GatewayConfig};
use relay_service::ServiceContext;

use crate::connection::ConnectionRegistry;
use crate::health::StoreHealth;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    /// Service context with repositories
    service_context: Arc<ServiceContext>,
    /// Registry of live connections
    registry: Arc<ConnectionRegistry>,
    /// Credential validator shared with the HTTP surface
    validator: Arc<CredentialValidator>,
    /// Outcome of the latest storage call
    health: Arc<StoreHealth>,
    /// Gateway tuning
    config: Arc<GatewayConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(
        service_context: Arc<ServiceContext>,
        registry: Arc<ConnectionRegistry>,
        validator: Arc<CredentialValidator>,
        health: Arc<StoreHealth>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            service_context,
            registry,
            validator,
            health,
            config: Arc::new(config),
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Get the connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Get the credential validator
    pub fn validator(&self) -> &CredentialValidator {
        &self.validator
    }

    /// Get the store health flag
    pub fn health(&self) -> &StoreHealth {
        &self.health
    }

    /// Get the gateway configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("health", &self.health.status())
            .field("config", &self.config)
            .finish()
    }
}

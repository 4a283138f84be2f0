//! Gateway server setup
//!
//! Routes and state construction. The gateway is mounted by the API binary
//! so ticket events from REST calls reach the same registry.

mod handler;
mod state;

pub use handler::{gateway_handler, GatewayQuery};
pub use state::GatewayState;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::get;
use axum::Router;
use relay_common::{CredentialValidator, GatewayConfig};
use relay_service::{ServiceContextBuilder, ServiceResult};

use crate::broadcast::GatewayBroadcaster;
use crate::connection::ConnectionRegistry;
use crate::health::StoreHealth;

/// Create the gateway router for any state the gateway state can be taken from
pub fn create_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    GatewayState: FromRef<S>,
{
    Router::new().route("/gateway", get(gateway_handler))
}

/// Build gateway state around a fresh registry.
///
/// The service context is completed with a broadcaster writing to that
/// registry, so ticket changes made anywhere in the process reach sockets.
pub fn create_gateway_state(
    services: ServiceContextBuilder,
    validator: CredentialValidator,
    config: GatewayConfig,
) -> ServiceResult<GatewayState> {
    let registry = ConnectionRegistry::new_shared();
    let service_context = services
        .broadcaster(Arc::new(GatewayBroadcaster::new(registry.clone())))
        .build()?;

    Ok(GatewayState::new(
        Arc::new(service_context),
        registry,
        Arc::new(validator),
        Arc::new(StoreHealth::new()),
        config,
    ))
}

//! Server setup and initialization
//!
//! Provides the application builder and server runner. The gateway shares
//! this process so REST ticket changes reach the same connection registry.

use std::sync::Arc;

use axum::Router;
use relay_common::{AppConfig, AppError, CredentialValidator};
use relay_db::{
    create_lazy_pool, DatabaseConfig, PgInAppNotificationRepository, PgMessageRepository,
    PgPool, PgPreferenceRepository, PgReadCursorRepository, PgRoomRepository,
    PgSupportEventRepository,
};
use relay_gateway::create_gateway_state;
use relay_service::{ServiceContext, ServiceContextBuilder};
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::apply_middleware;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let config = state.config();
    let router = apply_middleware(
        create_router(),
        &config.cors,
        config.app.env.is_production(),
    );
    router.with_state(state)
}

/// Repository wiring backed by PostgreSQL
pub fn postgres_services(pool: &PgPool) -> ServiceContextBuilder {
    ServiceContext::builder()
        .room_repo(Arc::new(PgRoomRepository::new(pool.clone())))
        .message_repo(Arc::new(PgMessageRepository::new(pool.clone())))
        .read_cursor_repo(Arc::new(PgReadCursorRepository::new(pool.clone())))
        .preference_repo(Arc::new(PgPreferenceRepository::new(pool.clone())))
        .in_app_repo(Arc::new(PgInAppNotificationRepository::new(pool.clone())))
        .support_event_repo(Arc::new(PgSupportEventRepository::new(pool.clone())))
}

/// Build application state around the given repositories
pub fn create_app_state_with(
    services: ServiceContextBuilder,
    config: AppConfig,
) -> Result<AppState, AppError> {
    let validator = CredentialValidator::new(&config.jwt.secret, config.jwt.accept_legacy);
    let gateway = create_gateway_state(services, validator, config.gateway.clone())
        .map_err(|e| AppError::Config(e.to_string()))?;
    Ok(AppState::new(gateway, config))
}

/// Initialize all dependencies and create AppState.
///
/// The pool connects lazily so sockets can be served while PostgreSQL is
/// still unreachable.
pub fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    let pool = create_lazy_pool(&DatabaseConfig::from(&config.database))
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL pool configured");

    create_app_state_with(postgres_services(&pool), config)
}

/// Run the HTTP server on a bound listener
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), AppError> {
    if let Ok(addr) = listener.local_addr() {
        info!("Server listening on http://{}", addr);
    }

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))
}

/// Run the HTTP server
pub async fn run_server(app: Router, addr: &str) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    serve(listener, app).await
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.api.address();

    let state = create_app_state(config)?;
    let app = create_app(state);

    run_server(app, &addr).await
}

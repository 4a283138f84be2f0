//! Health check handlers
//!
//! Liveness and readiness endpoints.

use axum::{extract::State, Json};
use relay_service::dto::{HealthResponse, ReadinessResponse};

use crate::state::AppState;

/// Basic health check (liveness)
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness with store reachability and gateway load.
///
/// Always 200: sockets keep relaying while the store is down, so the
/// process stays in rotation and reports the degraded store instead.
///
/// GET /health/ready
pub async fn readiness_check(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let registry = state.registry();
    let store = state.health().status();

    Json(ReadinessResponse {
        status: if state.health().is_available() {
            "ready"
        } else {
            "degraded"
        },
        store,
        connections: registry.connection_count(),
        users: registry.user_count(),
        rooms: registry.room_count(),
    })
}

//! Route definitions
//!
//! REST triggers are mounted under /api/v1; health and the gateway upgrade
//! live at the root.

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers::{auth, health, notifications, preferences, rooms, support};
use crate::state::AppState;

/// Create the main router with all routes
pub fn create_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .merge(health_routes())
        .merge(relay_gateway::create_router::<AppState>())
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/principal", get(auth::get_principal))
        .merge(support_routes())
        .merge(notification_routes())
        .route("/rooms/unread", get(rooms::get_unread))
}

/// Support ticket routes
fn support_routes() -> Router<AppState> {
    Router::new()
        .route("/support-events", post(support::create_support_event))
        .route("/support-events/:id", get(support::get_support_event))
        .route(
            "/support-events/:id/status",
            patch(support::update_support_status),
        )
        .route(
            "/support-events/:id/rating",
            post(support::rate_support_event),
        )
}

/// Notification and preference routes
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/preferences",
            get(preferences::get_preferences).patch(preferences::update_preferences),
        )
        .route(
            "/notifications/:id/read",
            post(notifications::mark_notification_read),
        )
        .route(
            "/notifications/:id/pin",
            post(notifications::pin_notification),
        )
}

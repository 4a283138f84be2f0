//! Notification preference handlers

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use relay_core::entities::UserNotificationPreference;
use relay_service::PreferenceService;
use serde_json::Value;

use crate::extractors::AuthUser;
use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

/// The caller's preference, created with defaults on first access
///
/// GET /notifications/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<UserNotificationPreference>> {
    let service = PreferenceService::new(state.service_context());
    Ok(Json(service.get(auth.user_id).await?))
}

/// Partial update; the document is validated as a whole before writing
///
/// PATCH /notifications/preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<UserNotificationPreference>> {
    let Json(document) = body.map_err(|e| ApiError::invalid_body(e.body_text()))?;

    let service = PreferenceService::new(state.service_context());
    Ok(Json(service.update(auth.user_id, &document).await?))
}

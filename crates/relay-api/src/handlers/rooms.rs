//! Room handlers

use axum::{extract::State, Json};
use relay_service::{UnreadResponse, UnreadService};

use crate::extractors::AuthUser;
use crate::response::ApiResult;
use crate::state::AppState;

/// Unread counts for every room the caller belongs to
///
/// GET /rooms/unread
pub async fn get_unread(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<UnreadResponse>> {
    let service = UnreadService::new(state.service_context());
    let snapshot = service.snapshot(auth.user_id).await?;
    Ok(Json(UnreadResponse::from(snapshot)))
}

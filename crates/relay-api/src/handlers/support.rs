//! Support ticket handlers
//!
//! Each accepted change is also pushed to the ticket room's sockets by the
//! service's broadcaster.

use axum::{extract::State, Json};
use relay_core::entities::SupportEventDetail;
use relay_service::{
    CreateSupportEventRequest, RateSupportEventRequest, SupportService,
    UpdateSupportStatusRequest,
};

use crate::extractors::{AuthUser, IdPath, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Open a ticket
///
/// POST /support-events
pub async fn create_support_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateSupportEventRequest>,
) -> ApiResult<Created<Json<SupportEventDetail>>> {
    let service = SupportService::new(state.service_context());
    let detail = service.create(auth.user_id, request).await?;
    Ok(Created(Json(detail)))
}

/// Ticket with its status log
///
/// GET /support-events/{id}
pub async fn get_support_event(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(event_id): IdPath,
) -> ApiResult<Json<SupportEventDetail>> {
    let service = SupportService::new(state.service_context());
    Ok(Json(service.get(auth.user_id, event_id).await?))
}

/// PATCH /support-events/{id}/status
pub async fn update_support_status(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(event_id): IdPath,
    ValidatedJson(request): ValidatedJson<UpdateSupportStatusRequest>,
) -> ApiResult<Json<SupportEventDetail>> {
    let service = SupportService::new(state.service_context());
    Ok(Json(service.transition(auth.user_id, event_id, request).await?))
}

/// POST /support-events/{id}/rating
pub async fn rate_support_event(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(event_id): IdPath,
    ValidatedJson(request): ValidatedJson<RateSupportEventRequest>,
) -> ApiResult<Json<SupportEventDetail>> {
    let service = SupportService::new(state.service_context());
    Ok(Json(service.rate(auth.user_id, event_id, request).await?))
}

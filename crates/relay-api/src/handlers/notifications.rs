//! In-app notification handlers

use axum::{extract::State, Json};
use relay_core::entities::InAppNotification;
use relay_service::{NotificationListQuery, NotificationService, PinNotificationRequest};

use crate::extractors::{AuthUser, IdPath, QueryParams, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// Latest non-expired notifications, pinned first
///
/// GET /notifications?unread_only=
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<NotificationListQuery>,
) -> ApiResult<Json<Vec<InAppNotification>>> {
    let service = NotificationService::new(state.service_context());
    Ok(Json(service.list(auth.user_id, query.unread_only).await?))
}

/// POST /notifications/{id}/read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<InAppNotification>> {
    let service = NotificationService::new(state.service_context());
    Ok(Json(service.mark_read(auth.user_id, id).await?))
}

/// POST /notifications/{id}/pin
pub async fn pin_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(request): ValidatedJson<PinNotificationRequest>,
) -> ApiResult<Json<InAppNotification>> {
    let service = NotificationService::new(state.service_context());
    Ok(Json(service.set_pinned(auth.user_id, id, request.pinned).await?))
}

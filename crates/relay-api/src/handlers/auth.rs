//! Credential introspection

use axum::Json;
use relay_service::dto::PrincipalResponse;

use crate::extractors::AuthUser;

/// Echo the caller's validated credential
///
/// GET /auth/principal
pub async fn get_principal(auth: AuthUser) -> Json<PrincipalResponse> {
    Json(PrincipalResponse::from(auth.principal))
}

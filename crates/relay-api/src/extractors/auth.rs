//! Authentication extractor
//!
//! Validates the bearer credential with the same validator the gateway uses,
//! so both schemes are accepted on REST calls too.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use relay_core::Principal;

use crate::response::ApiError;
use crate::state::AppState;

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User ID from the credential
    pub user_id: i64,
    /// Full principal, including which scheme was used
    pub principal: Principal,
}

impl From<Principal> for AuthUser {
    fn from(principal: Principal) -> Self {
        Self {
            user_id: principal.user_id,
            principal,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingAuth)?;

        let app_state = AppState::from_ref(state);

        let principal = app_state.validator().validate(bearer.token()).map_err(|e| {
            tracing::warn!(error = %e, "Credential refused");
            ApiError::Credential(e)
        })?;

        Ok(AuthUser::from(principal))
    }
}

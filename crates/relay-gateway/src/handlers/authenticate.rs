//! Authentication handler

use std::sync::Arc;

use relay_core::Principal;

use super::{HandlerResult, UnreadHandler};
use crate::connection::Connection;
use crate::protocol::ServerEvent;
use crate::server::GatewayState;

/// Binds connections to users
pub struct AuthenticateHandler;

impl AuthenticateHandler {
    /// Handle an `authenticate` frame
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        token: &str,
    ) -> HandlerResult<()> {
        let principal = state.validator().validate(token).map_err(|e| {
            tracing::debug!(
                session_id = %connection.session_id(),
                error = %e,
                "Credential refused"
            );
            e
        })?;

        Self::complete(state, connection, &principal).await;
        Ok(())
    }

    /// Finish authentication for a validated principal.
    ///
    /// Joins the personal channel, then sends `ready` and the initial
    /// unread snapshot.
    pub async fn complete(state: &GatewayState, connection: &Arc<Connection>, principal: &Principal) {
        let session_id = connection.session_id();
        let user_id = principal.user_id;
        state.registry().authenticate_connection(session_id, user_id);

        tracing::info!(
            session_id = %session_id,
            user_id,
            scheme = ?principal.scheme,
            "Connection authenticated"
        );

        let snapshot = UnreadHandler::snapshot(state, user_id).await;
        let ready = ServerEvent::ready(user_id, session_id, state.health().is_available());
        if connection.send(ready).await.is_err() {
            return;
        }
        if let Some(snapshot) = snapshot {
            for event in UnreadHandler::snapshot_events(&snapshot) {
                if connection.send(event).await.is_err() {
                    return;
                }
            }
        }
    }
}

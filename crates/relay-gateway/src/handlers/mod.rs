//! Client frame handlers
//!
//! Every frame from a connection is handled here, one at a time, in arrival
//! order. Rejected frames produce an `error` event; only authentication
//! failures end the connection.

mod authenticate;
mod error;
mod message;
mod room;
mod unread;

pub use authenticate::AuthenticateHandler;
pub use error::{HandlerError, HandlerResult};
pub use message::MessageHandler;
pub use room::RoomHandler;
pub use unread::UnreadHandler;

use std::sync::Arc;

use crate::connection::Connection;
use crate::protocol::{ClientEvent, CloseCode, ServerEvent};
use crate::server::GatewayState;

/// Routes decoded client frames to their handlers
pub struct FrameDispatcher;

impl FrameDispatcher {
    /// Handle one text frame.
    ///
    /// Returns a close code when the connection must end.
    pub async fn handle_text(
        state: &GatewayState,
        connection: &Arc<Connection>,
        text: &str,
    ) -> Option<CloseCode> {
        let (name, result) = match ClientEvent::from_json(text) {
            Ok(event) => {
                let name = event.name();
                (Some(name), Self::dispatch(state, connection, event).await)
            }
            Err(e) => (None, Err(HandlerError::from(e))),
        };

        let Err(err) = result else {
            return None;
        };

        tracing::debug!(
            session_id = %connection.session_id(),
            code = err.code(),
            error = %err,
            "Frame rejected"
        );
        Self::reply(connection, err.to_event(name)).await;
        err.to_close_code()
    }

    /// Handle a decoded client frame
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        event: ClientEvent,
    ) -> HandlerResult<()> {
        let user_id = match (&event, connection.user_id()) {
            (ClientEvent::Authenticate(payload), None) => {
                return AuthenticateHandler::handle(state, connection, &payload.token).await;
            }
            (ClientEvent::Authenticate(_), Some(_)) => {
                return Err(HandlerError::AlreadyAuthenticated);
            }
            (_, None) => return Err(HandlerError::NotAuthenticated),
            (_, Some(user_id)) => user_id,
        };

        match event {
            ClientEvent::JoinRoom(payload) => {
                RoomHandler::join(state, connection, payload.room_id);
                Ok(())
            }
            ClientEvent::LeaveRoom(payload) => {
                RoomHandler::leave(state, connection, payload.room_id);
                Ok(())
            }
            ClientEvent::Typing(payload) => {
                RoomHandler::typing(state, user_id, &payload);
                Ok(())
            }
            ClientEvent::SendMessage(payload) => {
                MessageHandler::handle(state, user_id, payload).await
            }
            ClientEvent::ReadRoom(payload) => {
                UnreadHandler::read_room(state, user_id, payload.room_id).await
            }
            ClientEvent::Ping => {
                Self::reply(connection, ServerEvent::pong()).await;
                Ok(())
            }
            ClientEvent::Authenticate(_) => Err(HandlerError::AlreadyAuthenticated),
        }
    }

    async fn reply(connection: &Connection, event: ServerEvent) {
        if let Err(e) = connection.send(event).await {
            tracing::debug!(
                session_id = %connection.session_id(),
                error = %e,
                "Failed to queue reply"
            );
        }
    }
}

//! Message relay handler

use chrono::Utc;
use relay_core::entities::MAX_MESSAGE_LENGTH;
use relay_service::{ServiceResult, UnreadService};

use super::{HandlerError, HandlerResult, UnreadHandler};
use crate::protocol::{SendMessagePayload, ServerEvent};
use crate::server::GatewayState;

/// Handles `send_message`
pub struct MessageHandler;

impl MessageHandler {
    /// Relay a message to the room, then update unread counts.
    ///
    /// The relay never waits on storage. Unread pushes and the sender's
    /// cursor are skipped when the store cannot answer.
    pub async fn handle(
        state: &GatewayState,
        user_id: i64,
        payload: SendMessagePayload,
    ) -> HandlerResult<()> {
        validate_text(&payload.text)?;

        let room_id = payload.room_id;
        let ctx = state.service_context();

        let message_id = match payload.message_id {
            Some(id) => Some(id),
            None => {
                let result: ServiceResult<Option<i64>> =
                    ctx.message_repo().latest_id(room_id).await.map_err(Into::into);
                state.health().observe("latest_message_id", result).flatten()
            }
        };

        let event = ServerEvent::message(room_id, message_id, &payload.text, user_id, Utc::now());
        let delivered = state.registry().send_to_room(room_id, &event, Some(user_id));

        tracing::debug!(room_id, user_id, ?message_id, delivered, "Message relayed");

        let unread = UnreadService::new(ctx);
        let recipients = match payload.to_user_ids {
            Some(ids) => Some(ids),
            None => state
                .health()
                .observe("room_members", unread.room_members(room_id).await)
                .map(Vec::from),
        };

        if let Some(mut recipients) = recipients {
            recipients.sort_unstable();
            recipients.dedup();
            for recipient in recipients.into_iter().filter(|&r| r != user_id) {
                UnreadHandler::push(state, recipient).await;
            }
        }

        state
            .health()
            .observe("mark_room_read", unread.mark_room_read(user_id, room_id).await);

        Ok(())
    }
}

fn validate_text(text: &str) -> HandlerResult<()> {
    if text.trim().is_empty() {
        return Err(HandlerError::Validation("text must not be empty".to_string()));
    }
    if text.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(HandlerError::Validation(format!(
            "text exceeds {MAX_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text() {
        assert!(validate_text("hello").is_ok());
        assert!(validate_text("   ").is_err());
        assert!(validate_text(&"é".repeat(MAX_MESSAGE_LENGTH)).is_ok());
        assert!(validate_text(&"a".repeat(MAX_MESSAGE_LENGTH + 1)).is_err());
    }
}

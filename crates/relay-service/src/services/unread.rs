//! Unread service
//!
//! Read cursors and unread counts. Counts are always derived from the
//! message and cursor tables; nothing here is cached.

use relay_core::entities::{ReadCursor, UnreadSnapshot};
use relay_core::DomainError;
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Unread service
pub struct UnreadService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> UnreadService<'a> {
    /// Create a new UnreadService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Unread counts across every room the user belongs to
    #[instrument(skip(self))]
    pub async fn snapshot(&self, user_id: i64) -> ServiceResult<UnreadSnapshot> {
        let counts = self.ctx.message_repo().unread_counts(user_id).await?;
        Ok(UnreadSnapshot::from_counts(counts))
    }

    /// Move the user's cursor to the room's latest message.
    ///
    /// Returns `None` when the room has no messages. The cursor never moves
    /// backwards, so repeating the call is harmless.
    #[instrument(skip(self))]
    pub async fn mark_room_read(
        &self,
        user_id: i64,
        room_id: i64,
    ) -> ServiceResult<Option<ReadCursor>> {
        let Some(latest) = self.ctx.message_repo().latest_id(room_id).await? else {
            debug!("Room has no messages; cursor unchanged");
            return Ok(None);
        };

        let cursor = self
            .ctx
            .read_cursor_repo()
            .advance(user_id, room_id, latest)
            .await?;
        Ok(Some(cursor))
    }

    /// The two members of a room
    #[instrument(skip(self))]
    pub async fn room_members(&self, room_id: i64) -> ServiceResult<[i64; 2]> {
        let room = self
            .ctx
            .room_repo()
            .find_by_id(room_id)
            .await?
            .ok_or(DomainError::RoomNotFound(room_id))?;
        Ok(room.members())
    }
}

//! Room entity <-> model mapper

use relay_core::{DomainError, Room};

use crate::models::RoomModel;

/// Convert RoomModel to Room entity
impl TryFrom<RoomModel> for Room {
    type Error = DomainError;

    fn try_from(model: RoomModel) -> Result<Self, Self::Error> {
        Ok(Room {
            id: model.id,
            kind: model.kind.parse()?,
            creator_id: model.creator_id,
            participant_id: model.participant_id,
            created_at: model.created_at,
        })
    }
}

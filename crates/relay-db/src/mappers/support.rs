//! Support ticket entities <-> model mapper

use relay_core::{DomainError, SupportEvent, SupportEventLog};

use crate::models::{SupportEventLogModel, SupportEventModel};

/// Convert SupportEventModel to SupportEvent entity
impl TryFrom<SupportEventModel> for SupportEvent {
    type Error = DomainError;

    fn try_from(model: SupportEventModel) -> Result<Self, Self::Error> {
        Ok(SupportEvent {
            id: model.id,
            chat_room_id: model.chat_room_id,
            user_id: model.user_id,
            admin_id: model.admin_id,
            status: model.status.parse()?,
            rating: model.rating,
            review: model.review,
            closed_at: model.closed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Convert SupportEventLogModel to SupportEventLog entity
impl TryFrom<SupportEventLogModel> for SupportEventLog {
    type Error = DomainError;

    fn try_from(model: SupportEventLogModel) -> Result<Self, Self::Error> {
        Ok(SupportEventLog {
            id: model.id,
            event_id: model.event_id,
            admin_id: model.admin_id,
            old_status: model.old_status.as_deref().map(str::parse).transpose()?,
            new_status: model.new_status.parse()?,
            created_at: model.created_at,
        })
    }
}

//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::entities::SupportStatus;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Room not found: {0}")]
    RoomNotFound(i64),

    #[error("Support event not found: {0}")]
    SupportEventNotFound(i64),

    #[error("Notification not found: {0}")]
    NotificationNotFound(i64),

    #[error("Queue entry not found: {0}")]
    QueueEntryNotFound(i64),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid preference field '{field}': {reason}")]
    InvalidPreference { field: String, reason: String },

    #[error("Unknown status: {0}")]
    InvalidStatus(String),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(i32),

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Not a participant of this room")]
    NotRoomParticipant,

    #[error("Only the ticket's customer may do this")]
    NotTicketCustomer,

    #[error("Transition to {to} is not permitted for this actor")]
    TransitionForbidden { to: SupportStatus },

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Ticket has already been rated")]
    AlreadyRated,

    #[error("Ticket was modified concurrently")]
    ConcurrentModification,

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Cannot move ticket from {from} to {to}")]
    InvalidTransition {
        from: SupportStatus,
        to: SupportStatus,
    },

    #[error("Ticket cannot be rated while {0}")]
    RatingNotAllowed(SupportStatus),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::RoomNotFound(_) => "UNKNOWN_ROOM",
            Self::SupportEventNotFound(_) => "UNKNOWN_SUPPORT_EVENT",
            Self::NotificationNotFound(_) => "UNKNOWN_NOTIFICATION",
            Self::QueueEntryNotFound(_) => "UNKNOWN_QUEUE_ENTRY",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidPreference { .. } => "INVALID_PREFERENCE",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::InvalidRating(_) => "INVALID_RATING",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",

            // Authorization
            Self::NotRoomParticipant => "NOT_ROOM_PARTICIPANT",
            Self::NotTicketCustomer => "NOT_TICKET_CUSTOMER",
            Self::TransitionForbidden { .. } => "TRANSITION_FORBIDDEN",

            // Conflict
            Self::AlreadyRated => "ALREADY_RATED",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",

            // Business Rules
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::RatingNotAllowed(_) => "RATING_NOT_ALLOWED",

            // Infrastructure
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RoomNotFound(_)
                | Self::SupportEventNotFound(_)
                | Self::NotificationNotFound(_)
                | Self::QueueEntryNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidPreference { .. }
                | Self::InvalidStatus(_)
                | Self::InvalidRating(_)
                | Self::ContentTooLong { .. }
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::NotRoomParticipant | Self::NotTicketCustomer | Self::TransitionForbidden { .. }
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRated
                | Self::ConcurrentModification
                | Self::InvalidTransition { .. }
                | Self::RatingNotAllowed(_)
        )
    }

    /// Check if the backing store could not be reached
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::RoomNotFound(7).code(), "UNKNOWN_ROOM");
        assert_eq!(DomainError::AlreadyRated.code(), "ALREADY_RATED");
        assert_eq!(
            DomainError::StorageUnavailable("pool timed out".into()).code(),
            "STORAGE_UNAVAILABLE"
        );
    }

    #[test]
    fn test_classification() {
        assert!(DomainError::SupportEventNotFound(1).is_not_found());
        assert!(DomainError::InvalidRating(9).is_validation());
        assert!(DomainError::NotRoomParticipant.is_authorization());
        assert!(DomainError::TransitionForbidden {
            to: SupportStatus::InProgress
        }
        .is_authorization());
        assert!(DomainError::AlreadyRated.is_conflict());
        assert!(DomainError::StorageUnavailable("down".into()).is_storage_unavailable());
        assert!(!DomainError::DatabaseError("syntax".into()).is_storage_unavailable());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidTransition {
            from: SupportStatus::ClosedByCustomer,
            to: SupportStatus::Open,
        };
        assert_eq!(err.to_string(), "Cannot move ticket from closed_by_customer to open");

        let err = DomainError::ContentTooLong { max: 4000 };
        assert_eq!(err.to_string(), "Content too long: max 4000 characters");
    }
}

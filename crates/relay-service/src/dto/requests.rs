//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Support Requests
// ============================================================================

/// Open a support ticket on a room
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSupportEventRequest {
    #[validate(range(min = 1, message = "chat_room_id must be positive"))]
    pub chat_room_id: i64,
}

/// Move a ticket to another status
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSupportStatusRequest {
    /// One of open, in_progress, resolved, closed_by_customer
    #[validate(length(min = 1, max = 32, message = "status is required"))]
    pub status: String,

    /// Only honoured on a customer close
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,

    #[validate(length(max = 2000, message = "Review must be at most 2000 characters"))]
    pub review: Option<String>,
}

/// Rate a resolved or closed ticket
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RateSupportEventRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 2000, message = "Review must be at most 2000 characters"))]
    pub review: Option<String>,
}

// ============================================================================
// Notification Requests
// ============================================================================

/// Pin or unpin an in-app notification
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PinNotificationRequest {
    pub pinned: bool,
}

/// Query parameters for listing in-app notifications
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[cfg(test)]
mod tests {
    use relay_core::entities::MAX_REVIEW_LENGTH;

    use super::*;

    #[test]
    fn test_status_request_validation() {
        let ok = UpdateSupportStatusRequest {
            status: "resolved".into(),
            rating: None,
            review: None,
        };
        assert!(ok.validate().is_ok());

        let bad_rating = UpdateSupportStatusRequest {
            status: "closed_by_customer".into(),
            rating: Some(6),
            review: None,
        };
        assert!(bad_rating.validate().is_err());

        let long_review = RateSupportEventRequest {
            rating: 4,
            review: Some("x".repeat(MAX_REVIEW_LENGTH + 1)),
        };
        assert!(long_review.validate().is_err());
    }

    #[test]
    fn test_create_request_validation() {
        assert!(CreateSupportEventRequest { chat_room_id: 0 }.validate().is_err());
        assert!(CreateSupportEventRequest { chat_room_id: 7 }.validate().is_ok());
    }
}

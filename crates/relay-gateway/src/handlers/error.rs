//! Handler error types

use relay_common::CredentialError;
use relay_service::ServiceError;
use thiserror::Error;

use crate::protocol::{CloseCode, FrameError, ServerEvent};

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Frame could not be decoded
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Payload decoded but breaks a rule
    #[error("{0}")]
    Validation(String),

    /// Acted before authenticating
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Credential refused
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(#[from] CredentialError),

    /// Sent authenticate twice
    #[error("Already authenticated")]
    AlreadyAuthenticated,

    /// The store could not be reached; nothing was applied
    #[error("Store unavailable")]
    StoreUnavailable,

    /// The store answered but refused the operation
    #[error(transparent)]
    Rejected(ServiceError),
}

impl From<ServiceError> for HandlerError {
    fn from(err: ServiceError) -> Self {
        if err.is_storage_unavailable() {
            Self::StoreUnavailable
        } else {
            Self::Rejected(err)
        }
    }
}

impl HandlerError {
    /// Error code carried in the `error` event
    pub fn code(&self) -> &str {
        match self {
            Self::Frame(FrameError::Malformed(_)) => "MALFORMED_FRAME",
            Self::Frame(FrameError::UnknownEvent(_)) => "UNKNOWN_EVENT",
            Self::Frame(FrameError::InvalidPayload { .. }) => "INVALID_PAYLOAD",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::AuthenticationFailed(e) => e.code(),
            Self::AlreadyAuthenticated => "ALREADY_AUTHENTICATED",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::Rejected(e) => e.error_code(),
        }
    }

    /// Close code for errors that end the connection
    pub fn to_close_code(&self) -> Option<CloseCode> {
        match self {
            Self::NotAuthenticated => Some(CloseCode::NotAuthenticated),
            Self::AuthenticationFailed(_) => Some(CloseCode::AuthenticationFailed),
            _ => None,
        }
    }

    /// The `error` event reported to the client
    pub fn to_event(&self, event: Option<&str>) -> ServerEvent {
        let event = match self {
            Self::Frame(e) => e.event().or(event),
            _ => event,
        };
        ServerEvent::error(self.code(), &self.to_string(), event)
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_failures_close() {
        assert_eq!(
            HandlerError::NotAuthenticated.to_close_code(),
            Some(CloseCode::NotAuthenticated)
        );
        assert_eq!(
            HandlerError::from(CredentialError::Expired).to_close_code(),
            Some(CloseCode::AuthenticationFailed)
        );
        assert_eq!(HandlerError::Validation("empty".into()).to_close_code(), None);
        assert_eq!(HandlerError::AlreadyAuthenticated.to_close_code(), None);
    }

    #[test]
    fn test_error_event_names_frame_event() {
        let err = HandlerError::from(FrameError::UnknownEvent("dance".into()));
        let event = err.to_event(None);
        assert_eq!(event.data["code"], "UNKNOWN_EVENT");
        assert_eq!(event.data["event"], "dance");

        let event = HandlerError::from(CredentialError::Expired).to_event(Some("authenticate"));
        assert_eq!(event.data["code"], "TOKEN_EXPIRED");
    }

    #[test]
    fn test_service_failures_map_to_codes() {
        use relay_core::DomainError;

        let down = HandlerError::from(ServiceError::from(DomainError::StorageUnavailable(
            "refused".into(),
        )));
        assert_eq!(down.code(), "STORE_UNAVAILABLE");
        assert_eq!(down.to_close_code(), None);

        let refused = HandlerError::from(ServiceError::validation("bad room"));
        assert_eq!(refused.code(), "VALIDATION_ERROR");
        assert_eq!(refused.to_event(Some("read_room")).data["event"], "read_room");
    }
}

//! Processor error types

use relay_core::entities::NotificationChannel;
use relay_core::DomainError;

/// Why a channel adapter could not deliver
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Worth another attempt later (timeouts, 5xx, rate limits)
    #[error("transient: {0}")]
    Transient(String),

    /// Retrying cannot help
    #[error("permanent: {0}")]
    Permanent(String),

    #[error("channel not configured: {0}")]
    NotConfigured(NotificationChannel),

    /// The adapter's own storage write failed
    #[error(transparent)]
    Storage(#[from] DomainError),
}

impl DeliveryError {
    /// Check if the entry should stay pending for another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Permanent(_) | Self::NotConfigured(_) => false,
            Self::Storage(e) => !e.is_validation(),
        }
    }

    /// Check if the failure means the store is down
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_storage_unavailable())
    }
}

/// Errors that stop an entry or a whole run
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ProcessorError {
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_storage_unavailable())
    }
}

/// Result type for processor operations
pub type ProcessorResult<T> = Result<T, ProcessorError>;

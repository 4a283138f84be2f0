//! Storage health flag
//!
//! The gateway keeps relaying when PostgreSQL is unreachable. This flag
//! records the outcome of the latest storage call so readiness checks and
//! new connections can report it.

use std::sync::atomic::{AtomicBool, Ordering};

use relay_service::ServiceResult;

/// Shared view of whether the store answered the last call
#[derive(Debug)]
pub struct StoreHealth {
    available: AtomicBool,
}

impl StoreHealth {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// "connected" or "unavailable"
    pub fn status(&self) -> &'static str {
        if self.is_available() {
            "connected"
        } else {
            "unavailable"
        }
    }

    pub fn mark_available(&self) {
        if !self.available.swap(true, Ordering::Relaxed) {
            tracing::info!("Store reachable again");
        }
    }

    pub fn mark_unavailable(&self) {
        if self.available.swap(false, Ordering::Relaxed) {
            tracing::warn!("Store unreachable; relaying without unread tracking");
        }
    }

    /// Record the outcome of a storage call and hand it back.
    ///
    /// Only storage outages flip the flag; other errors are logged and
    /// otherwise leave it alone.
    pub fn record<T>(&self, operation: &str, result: ServiceResult<T>) -> ServiceResult<T> {
        match &result {
            Ok(_) => self.mark_available(),
            Err(e) if e.is_storage_unavailable() => {
                self.mark_unavailable();
                tracing::warn!(operation, error = %e, "Storage call failed");
            }
            Err(e) => tracing::warn!(operation, error = %e, "Storage call rejected"),
        }
        result
    }

    /// Like `record`, for callers that carry on without the value
    pub fn observe<T>(&self, operation: &str, result: ServiceResult<T>) -> Option<T> {
        self.record(operation, result).ok()
    }
}

impl Default for StoreHealth {
    fn default() -> Self {
        Self::new()
    }
}

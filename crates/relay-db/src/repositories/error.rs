//! Error handling utilities for repositories

use relay_core::DomainError;
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError.
///
/// Connection-level failures become `StorageUnavailable` so callers can
/// tell "the database is down" apart from "the query was wrong".
pub fn map_db_error(e: SqlxError) -> DomainError {
    if is_unavailable(&e) {
        return DomainError::StorageUnavailable(e.to_string());
    }
    DomainError::DatabaseError(e.to_string())
}

fn is_unavailable(e: &SqlxError) -> bool {
    match e {
        SqlxError::Io(_)
        | SqlxError::Tls(_)
        | SqlxError::PoolTimedOut
        | SqlxError::PoolClosed
        | SqlxError::WorkerCrashed => true,
        // 08xxx connection exceptions, 57P01 admin shutdown
        SqlxError::Database(db) => db
            .code()
            .is_some_and(|code| code.starts_with("08") || code == "57P01"),
        _ => false,
    }
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    map_db_error(e)
}

/// Create a "support event not found" error
pub fn support_event_not_found(id: i64) -> DomainError {
    DomainError::SupportEventNotFound(id)
}

/// Create a "queue entry not found" error
pub fn queue_entry_not_found(id: i64) -> DomainError {
    DomainError::QueueEntryNotFound(id)
}

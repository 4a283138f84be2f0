//! Run lock - mutual exclusion for periodic jobs

use std::time::Duration;

use async_trait::async_trait;

use super::repositories::RepoResult;

/// Proof of holding a lock, required to release it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    pub key: String,
    pub value: String,
}

/// Advisory lock with a time-to-live.
///
/// A holder that dies without releasing loses the lock once the TTL passes.
#[async_trait]
pub trait RunLock: Send + Sync {
    /// Try to take the lock. `None` means someone else holds it.
    async fn try_acquire(&self, key: &str, ttl: Duration) -> RepoResult<Option<LockToken>>;

    /// Release the lock if `token` still owns it. Returns whether it did.
    async fn release(&self, token: &LockToken) -> RepoResult<bool>;
}

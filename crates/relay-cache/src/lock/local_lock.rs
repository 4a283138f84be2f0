//! In-process run lock with TTL, for single-host deployments and tests

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::traits::{LockToken, RepoResult, RunLock};

use super::{lock_key, new_token_value};

struct Held {
    value: String,
    expires_at: Instant,
}

/// Lock table living in this process; clones share it
#[derive(Clone, Default)]
pub struct LocalRunLock {
    held: Arc<Mutex<HashMap<String, Held>>>,
}

impl LocalRunLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for LocalRunLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRunLock")
            .field("held", &self.held.lock().len())
            .finish()
    }
}

#[async_trait]
impl RunLock for LocalRunLock {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> RepoResult<Option<LockToken>> {
        let key = lock_key(key);
        let now = Instant::now();
        let mut held = self.held.lock();

        if held.get(&key).is_some_and(|h| h.expires_at > now) {
            return Ok(None);
        }

        let value = new_token_value();
        held.insert(
            key.clone(),
            Held {
                value: value.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(Some(LockToken { key, value }))
    }

    async fn release(&self, token: &LockToken) -> RepoResult<bool> {
        let mut held = self.held.lock();
        if held.get(&token.key).is_some_and(|h| h.value == token.value) {
            held.remove(&token.key);
            return Ok(true);
        }
        Ok(false)
    }
}

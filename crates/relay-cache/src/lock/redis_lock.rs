//! Redis-backed run lock.
//!
//! Acquire is `SET key token NX PX ttl`; release is a compare-and-delete
//! script so only the holder can free the key.

use std::time::Duration;

use async_trait::async_trait;
use redis::Script;
use relay_core::traits::{LockToken, RepoResult, RunLock};
use tracing::{debug, instrument};

use super::{lock_key, new_token_value};
use crate::pool::{RedisPool, RedisPoolError};

const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Run lock shared by every process talking to the same Redis
#[derive(Clone)]
pub struct RedisRunLock {
    pool: RedisPool,
    release: Script,
}

impl RedisRunLock {
    /// Create a lock over the given pool
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            release: Script::new(RELEASE_SCRIPT),
        }
    }
}

impl std::fmt::Debug for RedisRunLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRunLock")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RunLock for RedisRunLock {
    #[instrument(skip(self))]
    async fn try_acquire(&self, key: &str, ttl: Duration) -> RepoResult<Option<LockToken>> {
        let key = lock_key(key);
        let value = new_token_value();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let mut conn = self.pool.get().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(&value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await
            .map_err(RedisPoolError::from)?;

        if reply.is_none() {
            debug!(key = %key, "Run lock held elsewhere");
            return Ok(None);
        }

        debug!(key = %key, ttl_ms, "Run lock acquired");
        Ok(Some(LockToken { key, value }))
    }

    #[instrument(skip(self, token), fields(key = %token.key))]
    async fn release(&self, token: &LockToken) -> RepoResult<bool> {
        let mut conn = self.pool.get().await?;
        let deleted: i32 = self
            .release
            .key(&token.key)
            .arg(&token.value)
            .invoke_async(&mut conn)
            .await
            .map_err(RedisPoolError::from)?;

        Ok(deleted > 0)
    }
}

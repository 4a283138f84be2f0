//! Run locks - TTL-bounded mutual exclusion for periodic jobs
//!
//! Both implementations hand out a random token on acquire and only release
//! when the caller presents the same token, so a run that outlived its TTL
//! cannot free a lock another run has since taken.

mod local_lock;
mod redis_lock;

pub use local_lock::LocalRunLock;
pub use redis_lock::RedisRunLock;

/// Key prefix for run locks
pub const LOCK_PREFIX: &str = "lock:";

fn lock_key(key: &str) -> String {
    format!("{LOCK_PREFIX}{key}")
}

fn new_token_value() -> String {
    uuid::Uuid::new_v4().to_string()
}

//! # relay-cache
//!
//! Redis connection pool and TTL run locks.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Run Locks**: `RunLock` implementations that keep periodic jobs from
//!   overlapping, backed by Redis or by process memory
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//! use relay_cache::{RedisPool, RedisPoolConfig, RedisRunLock};
//! use relay_core::RunLock;
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let lock = RedisRunLock::new(pool);
//!
//! if let Some(token) = lock.try_acquire("notify:run", Duration::from_secs(300)).await? {
//!     // ... do the work ...
//!     lock.release(&token).await?;
//! }
//! ```

pub mod lock;
pub mod pool;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export lock types
pub use lock::{LocalRunLock, RedisRunLock, LOCK_PREFIX};

//! Redis pool used by the run lock

mod redis_pool;

pub use redis_pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

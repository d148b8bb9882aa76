//! Cache module (fast store adapters)

pub mod memory_cache;
pub mod redis_cache;

pub use memory_cache::MemoryHistoryCache;
pub use redis_cache::RedisHistoryCache;

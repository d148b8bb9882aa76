//! # Focus Infrastructure
//! 
//! Durable store and fast store implementations (adapters).

pub mod cache;
pub mod database;

pub use cache::{MemoryHistoryCache, RedisHistoryCache};
pub use database::{create_pool, run_migrations, MemoryConversationStore, PgConversationStore};

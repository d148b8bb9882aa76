//! Application services

pub mod history_cache;
pub mod stats;

pub use history_cache::{ConversationHistoryCache, HealthReport};
pub use stats::{CacheStats, CacheStatsSnapshot};

// ============================================================================
// Focus Infrastructure - Redis Conversation Cache
// File: crates/focus-infrastructure/src/cache/redis_cache.rs
// ============================================================================
//! Redis fast store: one list per user at `{prefix}{user_id}`, JSON turns
//! oldest-first, expiry enforced by Redis itself.

use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use focus_core::domain::{ConversationTurn, UserId};
use focus_core::error::HistoryError;
use focus_core::ports::FastStore;

/// Redis-backed fast store using a deadpool connection pool.
#[derive(Clone)]
pub struct RedisHistoryCache {
    pool: Pool,
    key_prefix: String,
}

impl RedisHistoryCache {
    /// Create the pool. Connections are opened lazily on first use.
    pub fn new(
        url: &str,
        max_connections: usize,
        key_prefix: impl Into<String>,
    ) -> Result<Self, HistoryError> {
        let mut config = Config::from_url(url);
        config.pool = Some(PoolConfig::new(max_connections));

        let pool = config.create_pool(Some(Runtime::Tokio1)).map_err(|e| {
            error!("Failed to create Redis pool: {}", e);
            HistoryError::fast(format!("Failed to create Redis pool: {}", e))
        })?;

        info!("Redis conversation cache pool created (max_connections={})", max_connections);

        Ok(Self {
            pool,
            key_prefix: key_prefix.into(),
        })
    }

    fn key(&self, user_id: &UserId) -> String {
        build_key(&self.key_prefix, user_id)
    }

    async fn connection(&self) -> Result<Connection, HistoryError> {
        self.pool.get().await.map_err(|e| {
            error!("Redis pool checkout failed: {}", e);
            HistoryError::fast(e.to_string())
        })
    }
}

fn build_key(prefix: &str, user_id: &UserId) -> String {
    format!("{}{}", prefix, user_id)
}

/// Redis EXPIRE takes whole seconds; never send 0, which would delete the key.
fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1)
}

/// LTRIM start index that keeps the newest `max_length` elements (the list tail).
fn trim_start(max_length: usize) -> isize {
    -isize::try_from(max_length).unwrap_or(isize::MAX)
}

fn decode_turns(raw: &[String]) -> Result<Vec<ConversationTurn>, serde_json::Error> {
    raw.iter().map(|entry| serde_json::from_str(entry)).collect()
}

fn encode(turn: &ConversationTurn) -> Result<String, HistoryError> {
    serde_json::to_string(turn)
        .map_err(|e| HistoryError::fast(format!("Cache serialization failed: {}", e)))
}

fn redis_error(operation: &'static str) -> impl Fn(redis::RedisError) -> HistoryError {
    move |e| {
        error!("Redis {} operation failed: {}", operation, e);
        HistoryError::fast(format!("Cache error: {}", e))
    }
}

#[async_trait]
impl FastStore for RedisHistoryCache {
    async fn append_and_trim(
        &self,
        user_id: &UserId,
        turn: &ConversationTurn,
        max_length: usize,
        ttl: Duration,
    ) -> Result<bool, HistoryError> {
        let key = self.key(user_id);
        let payload = encode(turn)?;
        let mut conn = self.connection().await?;

        // MULTI/EXEC so the push, trim and expiry land together. RPUSHX never
        // creates the list, so a missing entry stays missing until the next read.
        let (length,): (u64,) = redis::pipe()
            .atomic()
            .rpush_exists(&key, payload)
            .ltrim(&key, trim_start(max_length), -1)
            .ignore()
            .expire(&key, ttl_secs(ttl))
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(redis_error("RPUSHX/LTRIM/EXPIRE"))?;

        Ok(length > 0)
    }

    async fn get_range(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Vec<ConversationTurn>>, HistoryError> {
        let key = self.key(user_id);
        let mut conn = self.connection().await?;

        let raw: Vec<String> = conn
            .lrange(&key, 0, -1)
            .await
            .map_err(redis_error("LRANGE"))?;

        if raw.is_empty() {
            return Ok(None);
        }

        match decode_turns(&raw) {
            Ok(turns) => Ok(Some(turns)),
            Err(e) => {
                // Drop the unreadable entry so the next read rebuilds it from the durable store
                warn!("Discarding undecodable cached history for user {}: {}", user_id, e);
                let _: u64 = conn.del(&key).await.map_err(redis_error("DEL"))?;
                Ok(None)
            }
        }
    }

    async fn set_expiry(&self, user_id: &UserId, ttl: Duration) -> Result<bool, HistoryError> {
        let key = self.key(user_id);
        let mut conn = self.connection().await?;

        let updated: bool = conn
            .expire(&key, ttl_secs(ttl))
            .await
            .map_err(redis_error("EXPIRE"))?;

        Ok(updated)
    }

    async fn replace(
        &self,
        user_id: &UserId,
        turns: &[ConversationTurn],
        ttl: Duration,
    ) -> Result<(), HistoryError> {
        let key = self.key(user_id);
        let payload = turns.iter().map(encode).collect::<Result<Vec<_>, _>>()?;
        let mut conn = self.connection().await?;

        let mut pipe = redis::pipe();
        pipe.atomic().del(&key).ignore();
        if !payload.is_empty() {
            pipe.rpush(&key, payload)
                .ignore()
                .expire(&key, ttl_secs(ttl))
                .ignore();
        }
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(redis_error("DEL/RPUSH/EXPIRE"))?;

        debug!("Replaced cached history for user {} ({} turns)", user_id, turns.len());
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> Result<bool, HistoryError> {
        let key = self.key(user_id);
        let mut conn = self.connection().await?;

        let removed: u64 = conn.del(&key).await.map_err(redis_error("DEL"))?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<(), HistoryError> {
        let mut conn = self.connection().await?;

        // Use PING to verify Redis connection is healthy
        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(redis_error("PING"))?;

        if response == "PONG" {
            Ok(())
        } else {
            Err(HistoryError::fast(format!(
                "Cache error: unexpected PING response '{}'",
                response
            )))
        }
    }
}

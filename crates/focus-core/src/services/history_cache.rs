// ============================================================================
// Focus Core - Conversation History Cache
// File: crates/focus-core/src/services/history_cache.rs
// ============================================================================
//! Per-user recent conversation history, served from a bounded expiring fast
//! store and backed by the durable store as the source of truth.
//!
//! - `append` writes the durable store first; the fast-store update afterwards
//!   is best-effort. An absent entry is rebuilt from the durable tail rather
//!   than started from the new turn alone.
//! - `recent` serves hits from the fast store, and on a miss reads the durable
//!   store and repopulates the fast store with its newest turns.
//! - Fast-store failures are never surfaced to callers except from `clear`.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::stats::{CacheStats, CacheStatsSnapshot};
use crate::clock::{Clock, SystemClock};
use crate::config::HistoryCacheConfig;
use crate::domain::{ConversationTurn, Metadata, NewTurn, UserId};
use crate::error::HistoryError;
use crate::ports::{DurableStore, FastStore};

/// Conversation history cache over a durable store `D` and a fast store `F`.
///
/// Both stores may be trait objects (`dyn DurableStore`, `dyn FastStore`).
pub struct ConversationHistoryCache<D: ?Sized, F: ?Sized> {
    durable: Arc<D>,
    fast: Arc<F>,
    config: HistoryCacheConfig,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
}

/// Reachability of both backing stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub durable: bool,
    pub fast: bool,
}

impl<D, F> ConversationHistoryCache<D, F>
where
    D: DurableStore + ?Sized,
    F: FastStore + ?Sized,
{
    pub fn new(durable: Arc<D>, fast: Arc<F>, config: HistoryCacheConfig) -> Self {
        Self::with_clock(durable, fast, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        durable: Arc<D>,
        fast: Arc<F>,
        config: HistoryCacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            "Initializing conversation history cache (max_history_length={}, ttl_seconds={})",
            config.max_history_length(),
            config.ttl_seconds()
        );
        Self {
            durable,
            fast,
            config,
            clock,
            stats: CacheStats::new(),
        }
    }

    pub fn config(&self) -> &HistoryCacheConfig {
        &self.config
    }

    /// Record a new turn for `user_id`.
    ///
    /// Fails only when the durable write fails, in which case the fast store
    /// is left untouched.
    pub async fn append(
        &self,
        user_id: &UserId,
        message: impl Into<String>,
        response: impl Into<String>,
        metadata: Option<Metadata>,
    ) -> Result<ConversationTurn, HistoryError> {
        let new_turn = NewTurn {
            user_id: user_id.clone(),
            message: message.into(),
            response: response.into(),
            metadata: metadata.unwrap_or_default(),
            created_at: self.clock.now(),
        };

        // 1. Durability point
        let turn = self.durable.insert(&new_turn).await.map_err(|e| {
            error!("Failed to record turn for user {}: {}", user_id, e);
            e
        })?;
        self.stats.inc_append();

        // 2. Best-effort cache update. A live entry is extended in place; an absent
        // one is rebuilt from the durable tail so it never holds a partial history.
        match self
            .fast
            .append_and_trim(
                user_id,
                &turn,
                self.config.max_history_length(),
                self.config.ttl(),
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => self.seed(user_id).await,
            Err(e) => {
                self.stats.inc_fast_store_error();
                warn!(
                    "Turn {} for user {} recorded but not cached: {}",
                    turn.id, user_id, e
                );
            }
        }

        debug!("Appended turn {} for user {}", turn.id, user_id);
        Ok(turn)
    }

    /// The newest `limit` turns for `user_id`, oldest first.
    ///
    /// `limit` defaults to `max_history_length`. Larger limits are read from
    /// the durable store directly and leave the fast store as it is.
    pub async fn recent(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<ConversationTurn>, HistoryError> {
        let capacity = self.config.max_history_length();
        let limit = match limit {
            Some(0) => {
                return Err(HistoryError::InvalidArgument(
                    "limit must be a positive integer".to_string(),
                ))
            }
            Some(n) => n,
            None => capacity,
        };

        if limit > capacity {
            self.stats.inc_bypass();
            debug!(
                "Limit {} exceeds cache capacity {}, reading durable store for user {}",
                limit, capacity, user_id
            );
            return self.durable.query_recent(user_id, limit).await.map_err(|e| {
                error!("Failed to read history for user {}: {}", user_id, e);
                e
            });
        }

        let repopulate = match self.fast.get_range(user_id).await {
            Ok(Some(mut turns)) if !turns.is_empty() => {
                self.stats.inc_hit();
                // Overlapping appends can land out of order
                turns.sort_by_key(ConversationTurn::ordering_key);
                self.touch(user_id).await;
                debug!("Cache hit for user {} ({} turns cached)", user_id, turns.len());
                return Ok(newest(turns, limit));
            }
            Ok(_) => {
                self.stats.inc_miss();
                debug!("Cache miss for user {}", user_id);
                true
            }
            Err(e) => {
                self.stats.inc_miss();
                self.stats.inc_fast_store_error();
                warn!(
                    "Fast store read failed for user {}, using durable store: {}",
                    user_id, e
                );
                false
            }
        };

        // Read a full cache window so the repopulated entry is the true tail
        let turns = self.durable.query_recent(user_id, capacity).await.map_err(|e| {
            error!("Failed to read history for user {}: {}", user_id, e);
            e
        })?;

        if repopulate {
            self.populate(user_id, &turns).await;
        }

        Ok(newest(turns, limit))
    }

    /// Drop the cached entry for `user_id`. Durable history is untouched.
    pub async fn clear(&self, user_id: &UserId) -> Result<bool, HistoryError> {
        let removed = self.fast.delete(user_id).await.map_err(|e| {
            error!("Failed to clear cache for user {}: {}", user_id, e);
            e
        })?;
        info!("Cache cleared for user {} (entry existed: {})", user_id, removed);
        Ok(removed)
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    pub async fn health(&self) -> HealthReport {
        let (durable, fast) = tokio::join!(self.durable.ping(), self.fast.ping());
        if let Err(e) = &durable {
            warn!("Durable store health check failed: {}", e);
        }
        if let Err(e) = &fast {
            warn!("Fast store health check failed: {}", e);
        }
        HealthReport {
            durable: durable.is_ok(),
            fast: fast.is_ok(),
        }
    }

    /// Cache the durable tail for a user whose entry was absent when a turn was appended.
    async fn seed(&self, user_id: &UserId) {
        match self
            .durable
            .query_recent(user_id, self.config.max_history_length())
            .await
        {
            Ok(turns) => self.populate(user_id, &turns).await,
            Err(e) => warn!("Could not read history to cache for user {}: {}", user_id, e),
        }
    }

    async fn populate(&self, user_id: &UserId, turns: &[ConversationTurn]) {
        if turns.is_empty() {
            return;
        }
        if let Err(e) = self.fast.replace(user_id, turns, self.config.ttl()).await {
            self.stats.inc_fast_store_error();
            warn!("Failed to repopulate cache for user {}: {}", user_id, e);
        } else {
            debug!("Repopulated cache for user {} with {} turns", user_id, turns.len());
        }
    }

    /// Reads count as activity, so a hit slides the expiry window.
    async fn touch(&self, user_id: &UserId) {
        if let Err(e) = self.fast.set_expiry(user_id, self.config.ttl()).await {
            self.stats.inc_fast_store_error();
            warn!("Failed to extend cache expiry for user {}: {}", user_id, e);
        }
    }
}

fn newest(mut turns: Vec<ConversationTurn>, limit: usize) -> Vec<ConversationTurn> {
    if turns.len() > limit {
        let excess = turns.len() - limit;
        turns.drain(..excess);
    }
    turns
}

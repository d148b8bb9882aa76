use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use focus_core::clock::{Clock, SystemClock};
use focus_core::domain::{ConversationTurn, UserId};
use focus_core::error::HistoryError;
use focus_core::ports::FastStore;

/// Appends between sweeps of expired entries.
const PURGE_INTERVAL: u64 = 256;

struct CachedHistory {
    turns: VecDeque<ConversationTurn>,
    expires_at: DateTime<Utc>,
}

impl CachedHistory {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe in-process fast store.
/// Uses DashMap entry locking for per-user atomicity. Expiry is checked lazily on
/// access, and expired entries of idle users are swept every `PURGE_INTERVAL` appends.
pub struct MemoryHistoryCache {
    entries: DashMap<UserId, CachedHistory>,
    clock: Arc<dyn Clock>,
    appends: AtomicU64,
}

impl MemoryHistoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        info!("Initializing in-memory conversation cache with DashMap");
        Self {
            entries: DashMap::new(),
            clock,
            appends: AtomicU64::new(0),
        }
    }

    /// Number of entries held, expired ones included until they are purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    fn expiry_from(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn push_live(
        &self,
        user_id: &UserId,
        turn: &ConversationTurn,
        max_length: usize,
        ttl: Duration,
    ) -> bool {
        let now = self.clock.now();

        let Some(mut entry) = self.entries.get_mut(user_id) else {
            return false;
        };
        if entry.is_expired(now) {
            return false;
        }

        // Keep (created_at, id) order when overlapping appends finish out of order
        let key = turn.ordering_key();
        let pos = entry.turns.partition_point(|t| t.ordering_key() <= key);
        entry.turns.insert(pos, turn.clone());
        while entry.turns.len() > max_length {
            entry.turns.pop_front();
        }
        entry.expires_at = Self::expiry_from(now, ttl);
        true
    }
}

impl Default for MemoryHistoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FastStore for MemoryHistoryCache {
    async fn append_and_trim(
        &self,
        user_id: &UserId,
        turn: &ConversationTurn,
        max_length: usize,
        ttl: Duration,
    ) -> Result<bool, HistoryError> {
        // Entry guard is released before any sweep touches the shards
        let appended = self.push_live(user_id, turn, max_length, ttl);

        if self.appends.fetch_add(1, Ordering::Relaxed) % PURGE_INTERVAL == PURGE_INTERVAL - 1 {
            self.purge_expired();
        }

        Ok(appended)
    }

    async fn get_range(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Vec<ConversationTurn>>, HistoryError> {
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(user_id) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.turns.iter().cloned().collect()));
            }
        } else {
            return Ok(None);
        }

        // Lazy deletion (read guard released above)
        self.entries.remove_if(user_id, |_, entry| entry.is_expired(now));
        debug!("Cached history for user {} expired, removed", user_id);
        Ok(None)
    }

    async fn set_expiry(&self, user_id: &UserId, ttl: Duration) -> Result<bool, HistoryError> {
        let now = self.clock.now();
        match self.entries.get_mut(user_id) {
            Some(mut entry) if !entry.is_expired(now) => {
                entry.expires_at = Self::expiry_from(now, ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn replace(
        &self,
        user_id: &UserId,
        turns: &[ConversationTurn],
        ttl: Duration,
    ) -> Result<(), HistoryError> {
        if turns.is_empty() {
            self.entries.remove(user_id);
            return Ok(());
        }

        let expires_at = Self::expiry_from(self.clock.now(), ttl);
        self.entries.insert(
            user_id.clone(),
            CachedHistory {
                turns: turns.iter().cloned().collect(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> Result<bool, HistoryError> {
        let now = self.clock.now();
        Ok(self
            .entries
            .remove(user_id)
            .map(|(_, entry)| !entry.is_expired(now))
            .unwrap_or(false))
    }

    async fn ping(&self) -> Result<(), HistoryError> {
        Ok(())
    }
}

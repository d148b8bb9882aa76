use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for cache decisions, shared by all callers of one cache instance.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits_total: AtomicU64,
    misses_total: AtomicU64,
    bypasses_total: AtomicU64,
    fast_store_errors_total: AtomicU64,
    appends_total: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_hit(&self) {
        self.hits_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_miss(&self) {
        self.misses_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_bypass(&self) {
        self.bypasses_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_fast_store_error(&self) {
        self.fast_store_errors_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_append(&self) {
        self.appends_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits_total.load(Ordering::Relaxed),
            misses: self.misses_total.load(Ordering::Relaxed),
            bypasses: self.bypasses_total.load(Ordering::Relaxed),
            fast_store_errors: self.fast_store_errors_total.load(Ordering::Relaxed),
            appends: self.appends_total.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    /// Reads whose limit exceeded the cache capacity and went straight to the durable store.
    pub bypasses: u64,
    pub fast_store_errors: u64,
    pub appends: u64,
}

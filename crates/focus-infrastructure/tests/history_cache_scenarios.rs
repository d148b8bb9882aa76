// File: crates/focus-infrastructure/tests/history_cache_scenarios.rs
//
// End-to-end behaviour of the conversation history cache over the in-memory
// adapters, with simulated time.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use focus_core::clock::ManualClock;
use focus_core::domain::{ConversationTurn, NewTurn, UserId};
use focus_core::error::HistoryError;
use focus_core::ports::{DurableStore, FastStore};
use focus_core::{ConversationHistoryCache, HistoryCacheConfig};
use focus_infrastructure::{MemoryConversationStore, MemoryHistoryCache};

/// Durable store wrapper that counts reads and can hold back one insert's reply.
#[derive(Default)]
struct CountingStore {
    inner: MemoryConversationStore,
    reads: AtomicUsize,
    slow_insert: Option<(&'static str, std::time::Duration)>,
}

impl CountingStore {
    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DurableStore for CountingStore {
    async fn insert(&self, turn: &NewTurn) -> Result<ConversationTurn, HistoryError> {
        let stored = self.inner.insert(turn).await?;
        if let Some((message, delay)) = self.slow_insert {
            if turn.message == message {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(stored)
    }

    async fn query_recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, HistoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.query_recent(user_id, limit).await
    }

    async fn ping(&self) -> Result<(), HistoryError> {
        self.inner.ping().await
    }
}

struct Harness {
    cache: Arc<ConversationHistoryCache<CountingStore, MemoryHistoryCache>>,
    durable: Arc<CountingStore>,
    fast: Arc<MemoryHistoryCache>,
    clock: Arc<ManualClock>,
}

fn harness(max_history_length: usize, ttl_seconds: u64) -> Harness {
    harness_with(CountingStore::default(), max_history_length, ttl_seconds)
}

fn harness_with(durable: CountingStore, max_history_length: usize, ttl_seconds: u64) -> Harness {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    ));
    let durable = Arc::new(durable);
    let fast = Arc::new(MemoryHistoryCache::with_clock(clock.clone()));
    let cache = Arc::new(ConversationHistoryCache::with_clock(
        durable.clone(),
        fast.clone(),
        HistoryCacheConfig::new(max_history_length, ttl_seconds).unwrap(),
        clock.clone(),
    ));
    Harness {
        cache,
        durable,
        fast,
        clock,
    }
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn messages(turns: &[ConversationTurn]) -> Vec<&str> {
    turns.iter().map(|t| t.message.as_str()).collect()
}

fn owned(items: &[&str]) -> Option<Vec<String>> {
    Some(items.iter().map(|s| s.to_string()).collect())
}

impl Harness {
    async fn append_all(&self, user_id: &UserId, items: &[&str]) {
        for item in items {
            self.clock.advance(Duration::seconds(1));
            self.cache
                .append(user_id, *item, format!("reply to {}", item), None)
                .await
                .unwrap();
        }
    }

    async fn cached(&self, user_id: &UserId) -> Option<Vec<String>> {
        self.fast
            .get_range(user_id)
            .await
            .unwrap()
            .map(|turns| turns.into_iter().map(|t| t.message).collect())
    }
}

#[tokio::test]
async fn worked_example_from_append_to_repopulation() {
    let h = harness(3, 100);
    let u1 = user("u1");
    h.append_all(&u1, &["A", "B", "C", "D", "E"]).await;
    let reads = h.durable.reads();

    let recent = h.cache.recent(&u1, Some(3)).await.unwrap();
    assert_eq!(messages(&recent), vec!["C", "D", "E"]);
    assert_eq!(h.durable.reads(), reads);

    let everything = h.cache.recent(&u1, Some(10)).await.unwrap();
    assert_eq!(messages(&everything), vec!["A", "B", "C", "D", "E"]);
    assert_eq!(h.durable.reads(), reads + 1);

    assert!(h.cache.clear(&u1).await.unwrap());
    assert_eq!(h.cached(&u1).await, None);

    let recent = h.cache.recent(&u1, Some(2)).await.unwrap();
    assert_eq!(messages(&recent), vec!["D", "E"]);
    assert_eq!(h.durable.reads(), reads + 2);
    assert_eq!(h.cached(&u1).await, owned(&["C", "D", "E"]));
}

#[tokio::test]
async fn recent_after_appends_returns_last_turns_in_order() {
    let h = harness(5, 100);
    let u1 = user("u1");
    h.append_all(&u1, &["one", "two"]).await;
    let reads = h.durable.reads();

    let recent = h.cache.recent(&u1, Some(5)).await.unwrap();
    assert_eq!(messages(&recent), vec!["one", "two"]);

    let default_limit = h.cache.recent(&u1, None).await.unwrap();
    assert_eq!(default_limit, recent);
    assert_eq!(h.durable.reads(), reads);
    assert_eq!(h.cache.stats().hits, 2);
}

#[tokio::test]
async fn cache_stays_bounded_to_newest_turns() {
    let h = harness(4, 100);
    let u1 = user("u1");
    let items: Vec<String> = (1..=10).map(|i| format!("t{}", i)).collect();
    let refs: Vec<&str> = items.iter().map(String::as_str).collect();
    h.append_all(&u1, &refs).await;

    assert_eq!(
        h.cached(&u1).await,
        Some(vec!["t7".into(), "t8".into(), "t9".into(), "t10".into()])
    );
    assert_eq!(h.durable.inner.count(&u1), 10);
}

#[tokio::test]
async fn expired_entry_is_a_miss_without_explicit_clear() {
    let h = harness(3, 100);
    let u1 = user("u1");
    h.append_all(&u1, &["A", "B"]).await;
    let reads = h.durable.reads();

    h.clock.advance(Duration::seconds(101));
    let recent = h.cache.recent(&u1, None).await.unwrap();

    assert_eq!(messages(&recent), vec!["A", "B"]);
    assert_eq!(h.durable.reads(), reads + 1);
    assert_eq!(h.cache.stats().misses, 1);
    // Repopulated with a fresh window
    assert_eq!(h.cached(&u1).await, Some(vec!["A".into(), "B".into()]));
}

#[tokio::test]
async fn reads_keep_the_entry_alive() {
    let h = harness(3, 100);
    let u1 = user("u1");
    h.append_all(&u1, &["A"]).await;
    let reads = h.durable.reads();

    for _ in 0..3 {
        h.clock.advance(Duration::seconds(80));
        h.cache.recent(&u1, None).await.unwrap();
    }
    assert_eq!(h.durable.reads(), reads);
}

#[tokio::test]
async fn oversized_limit_leaves_cache_untouched() {
    let h = harness(3, 100);
    let u1 = user("u1");
    h.append_all(&u1, &["A", "B", "C", "D"]).await;

    let all = h.cache.recent(&u1, Some(50)).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(h.cached(&u1).await, owned(&["B", "C", "D"]));
    assert_eq!(h.cache.stats().bypasses, 1);
}

#[tokio::test]
async fn users_do_not_share_history() {
    let h = harness(3, 100);
    h.append_all(&user("u1"), &["mine"]).await;
    h.append_all(&user("u2"), &["theirs"]).await;

    let recent = h.cache.recent(&user("u2"), None).await.unwrap();
    assert_eq!(messages(&recent), vec!["theirs"]);

    let unknown = h.cache.recent(&user("u3"), None).await.unwrap();
    assert!(unknown.is_empty());
    assert_eq!(h.cached(&user("u3")).await, None);
}

#[tokio::test]
async fn append_after_clear_caches_the_true_tail() {
    let h = harness(3, 100);
    let u1 = user("u1");
    h.append_all(&u1, &["A", "B", "C", "D", "E"]).await;

    assert!(h.cache.clear(&u1).await.unwrap());
    h.append_all(&u1, &["F"]).await;
    assert_eq!(h.cached(&u1).await, owned(&["D", "E", "F"]));

    let reads = h.durable.reads();
    let recent = h.cache.recent(&u1, Some(3)).await.unwrap();
    assert_eq!(messages(&recent), vec!["D", "E", "F"]);
    assert_eq!(h.durable.reads(), reads);
}

#[tokio::test]
async fn append_after_expiry_caches_the_true_tail() {
    let h = harness(3, 100);
    let u1 = user("u1");
    h.append_all(&u1, &["A", "B", "C"]).await;

    h.clock.advance(Duration::seconds(200));
    h.append_all(&u1, &["D"]).await;

    let recent = h.cache.recent(&u1, Some(3)).await.unwrap();
    assert_eq!(messages(&recent), vec!["B", "C", "D"]);
    assert_eq!(h.cache.stats().hits, 1);
}

#[tokio::test]
async fn late_finishing_append_is_read_back_in_order() {
    let durable = CountingStore {
        slow_insert: Some(("A", std::time::Duration::from_millis(200))),
        ..Default::default()
    };
    let h = harness_with(durable, 5, 100);
    let u1 = user("u1");
    h.append_all(&u1, &["start"]).await;

    h.clock.advance(Duration::seconds(1));
    let slow = {
        let cache = h.cache.clone();
        let u1 = u1.clone();
        tokio::spawn(async move { cache.append(&u1, "A", "ok", None).await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    h.append_all(&u1, &["B"]).await;
    slow.await.unwrap().unwrap();

    let recent = h.cache.recent(&u1, None).await.unwrap();
    assert_eq!(messages(&recent), vec!["start", "A", "B"]);
    assert_eq!(h.cache.stats().hits, 1);
}

#[tokio::test]
async fn concurrent_appends_are_all_durable_and_read_back_in_order() {
    let h = harness(50, 100);
    let u1 = user("u1");
    h.append_all(&u1, &["start"]).await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..20 {
        let cache = h.cache.clone();
        let u1 = u1.clone();
        tasks.spawn(async move { cache.append(&u1, format!("m{}", i), "ok", None).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(h.durable.inner.count(&u1), 21);

    let in_order = |turns: &[ConversationTurn]| {
        turns
            .windows(2)
            .all(|pair| pair[0].ordering_key() < pair[1].ordering_key())
    };

    // Served from the cache
    let reads = h.durable.reads();
    let cached = h.cache.recent(&u1, None).await.unwrap();
    assert_eq!(h.durable.reads(), reads);
    assert_eq!(cached.len(), 21);
    assert!(in_order(&cached));

    // Rebuilt from the durable store
    h.cache.clear(&u1).await.unwrap();
    let rebuilt = h.cache.recent(&u1, None).await.unwrap();
    assert_eq!(rebuilt, cached);
    assert!(in_order(&rebuilt));
}

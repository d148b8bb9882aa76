//! Process-local durable store for running without PostgreSQL.
//!
//! History lives only as long as the process.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

use focus_core::domain::{ConversationTurn, NewTurn, UserId};
use focus_core::error::HistoryError;
use focus_core::ports::DurableStore;

#[derive(Default)]
pub struct MemoryConversationStore {
    last_id: AtomicI64,
    turns: DashMap<UserId, Vec<ConversationTurn>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of turns recorded for `user_id`.
    pub fn count(&self, user_id: &UserId) -> usize {
        self.turns.get(user_id).map(|t| t.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DurableStore for MemoryConversationStore {
    async fn insert(&self, turn: &NewTurn) -> Result<ConversationTurn, HistoryError> {
        let mut history = self.turns.entry(turn.user_id.clone()).or_default();

        // Assigned under the per-user lock so ids within a user follow insertion order
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = ConversationTurn::from_new(id, turn.clone());

        // Keep (created_at, id) order even if a caller's clock stepped backwards
        let key = stored.ordering_key();
        let pos = history.partition_point(|t| t.ordering_key() <= key);
        history.insert(pos, stored.clone());

        debug!("Stored turn {} for user {} in memory", id, turn.user_id);
        Ok(stored)
    }

    async fn query_recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, HistoryError> {
        Ok(self
            .turns
            .get(user_id)
            .map(|history| {
                let start = history.len().saturating_sub(limit);
                history[start..].to_vec()
            })
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), HistoryError> {
        Ok(())
    }
}

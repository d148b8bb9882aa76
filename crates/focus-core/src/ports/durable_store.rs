//! Durable conversation store trait (port)

use async_trait::async_trait;

use crate::domain::{ConversationTurn, NewTurn, UserId};
use crate::error::HistoryError;

/// Permanent, authoritative record of every conversation turn.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Persist a turn and assign its insertion sequence.
    async fn insert(&self, turn: &NewTurn) -> Result<ConversationTurn, HistoryError>;

    /// The newest `limit` turns for `user_id`, ascending by `(created_at, id)`.
    async fn query_recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, HistoryError>;

    async fn ping(&self) -> Result<(), HistoryError>;
}

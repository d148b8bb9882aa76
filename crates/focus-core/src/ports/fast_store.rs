//! Fast (cache) store trait (port)
//!
//! Implementations hold one oldest-first list per user with an expiry. Every
//! operation is atomic per key; nothing spans keys.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{ConversationTurn, UserId};
use crate::error::HistoryError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FastStore: Send + Sync {
    /// Append `turn` to a live entry, keep only the newest `max_length` turns and
    /// reset the expiry to `ttl`.
    ///
    /// Returns `false` and writes nothing when the entry is absent or expired; a
    /// fresh list would hold only part of the user's history.
    async fn append_and_trim(
        &self,
        user_id: &UserId,
        turn: &ConversationTurn,
        max_length: usize,
        ttl: Duration,
    ) -> Result<bool, HistoryError>;

    /// Stored turns oldest-first, or `None` when the entry is absent or expired.
    async fn get_range(&self, user_id: &UserId)
        -> Result<Option<Vec<ConversationTurn>>, HistoryError>;

    /// Reset the expiry. Returns `false` when nothing is stored for the user.
    async fn set_expiry(&self, user_id: &UserId, ttl: Duration) -> Result<bool, HistoryError>;

    /// Replace the whole entry with `turns` and set the expiry. An empty slice leaves it absent.
    async fn replace(
        &self,
        user_id: &UserId,
        turns: &[ConversationTurn],
        ttl: Duration,
    ) -> Result<(), HistoryError>;

    /// Remove the entry. Returns whether one existed.
    async fn delete(&self, user_id: &UserId) -> Result<bool, HistoryError>;

    async fn ping(&self) -> Result<(), HistoryError>;
}

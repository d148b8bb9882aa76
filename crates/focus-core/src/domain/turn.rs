//! Conversation turn domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use focus_shared::constants::PRIMARY_AGENT_METADATA_KEY;

use super::agent::AgentKind;
use crate::error::HistoryError;

/// Open key-value mapping carried alongside each turn.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Opaque identifier of the user owning a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Result<Self, HistoryError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(HistoryError::InvalidArgument(
                "user_id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = HistoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserId::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// A turn that has not yet been written to the durable store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTurn {
    pub user_id: UserId,
    pub message: String,
    pub response: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

/// One request/response exchange, as recorded by the durable store.
///
/// `id` is the insertion sequence assigned on insert. Within a user's history
/// turns are ordered by `(created_at, id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: i64,
    pub user_id: UserId,
    pub message: String,
    pub response: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn from_new(id: i64, turn: NewTurn) -> Self {
        Self {
            id,
            user_id: turn.user_id,
            message: turn.message,
            response: turn.response,
            metadata: turn.metadata,
            created_at: turn.created_at,
        }
    }

    pub fn ordering_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.id)
    }

    /// Agent recorded by the chat layer under the `primary_agent` metadata key.
    pub fn primary_agent(&self) -> Option<AgentKind> {
        self.metadata
            .get(PRIMARY_AGENT_METADATA_KEY)
            .and_then(|value| value.as_str())
            .and_then(|name| name.parse().ok())
    }
}

// ============================================================================
// Focus Infrastructure - PostgreSQL Conversation Store
// File: crates/focus-infrastructure/src/database/conversation_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use tracing::{debug, error};

use focus_core::domain::{ConversationTurn, Metadata, NewTurn, UserId};
use focus_core::error::HistoryError;
use focus_core::ports::DurableStore;

pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct ConversationTurnRow {
    pub id: i64,
    pub user_id: String,
    pub message: String,
    pub response: String,
    pub metadata_json: Json<Metadata>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ConversationTurnRow> for ConversationTurn {
    type Error = HistoryError;

    fn try_from(row: ConversationTurnRow) -> Result<Self, Self::Error> {
        let user_id = UserId::new(row.user_id).map_err(|e| {
            HistoryError::durable(format!("corrupt conversation row {}: {}", row.id, e))
        })?;
        Ok(ConversationTurn {
            id: row.id,
            user_id,
            message: row.message,
            response: row.response,
            metadata: row.metadata_json.0,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl DurableStore for PgConversationStore {
    async fn insert(&self, turn: &NewTurn) -> Result<ConversationTurn, HistoryError> {
        let row: ConversationTurnRow = sqlx::query_as(
            r#"
            INSERT INTO conversation_history (user_id, message, response, metadata_json, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, message, response, metadata_json, created_at
            "#,
        )
        .bind(turn.user_id.as_str())
        .bind(&turn.message)
        .bind(&turn.response)
        .bind(Json(&turn.metadata))
        .bind(turn.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error inserting conversation turn: {}", e);
            HistoryError::durable(e.to_string())
        })?;

        debug!("Inserted conversation turn {} for user {}", row.id, row.user_id);
        row.try_into()
    }

    async fn query_recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, HistoryError> {
        let rows: Vec<ConversationTurnRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, message, response, metadata_json, created_at
            FROM conversation_history
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error reading history for user {}: {}", user_id, e);
            HistoryError::durable(e.to_string())
        })?;

        // Newest-first from the index, returned oldest-first
        rows.into_iter().rev().map(ConversationTurn::try_from).collect()
    }

    async fn ping(&self) -> Result<(), HistoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e: sqlx::Error| {
                error!("Database ping failed: {}", e);
                HistoryError::durable(e.to_string())
            })?;
        Ok(())
    }
}

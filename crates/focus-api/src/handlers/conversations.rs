use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use focus_core::{CacheStatsSnapshot, ConversationTurn, Metadata, UserId};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecordTurnRequest {
    pub user_id: String,
    pub message: String,
    pub response: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub user_id: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ClearCacheRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub user_id: String,
    pub cleared: bool,
    pub message: String,
}

pub async fn record_turn(
    State(state): State<AppState>,
    Json(payload): Json<RecordTurnRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ConversationTurn>>), ApiError> {
    let user_id = UserId::new(payload.user_id)?;

    let turn = state
        .history
        .append(&user_id, payload.message, payload.response, payload.metadata)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(turn))))
}

pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<ConversationTurn>>>, ApiError> {
    let user_id = UserId::new(query.user_id)?;
    let turns = state.history.recent(&user_id, query.limit).await?;

    tracing::debug!("Returning {} turns for user {}", turns.len(), user_id);
    Ok(Json(ApiResponse::success(turns)))
}

pub async fn clear_cache(
    State(state): State<AppState>,
    Json(payload): Json<ClearCacheRequest>,
) -> Result<Json<ApiResponse<ClearCacheResponse>>, ApiError> {
    let user_id = UserId::new(payload.user_id)?;
    let cleared = state.history.clear(&user_id).await?;

    let message = if cleared {
        "Cached history cleared"
    } else {
        "No cached history for user"
    };

    Ok(Json(ApiResponse::success(ClearCacheResponse {
        user_id: user_id.to_string(),
        cleared,
        message: message.to_string(),
    })))
}

pub async fn cache_stats(State(state): State<AppState>) -> Json<ApiResponse<CacheStatsSnapshot>> {
    Json(ApiResponse::success(state.history.stats()))
}

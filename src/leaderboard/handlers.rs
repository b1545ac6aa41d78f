use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use tracing::instrument;

use super::models::{LeaderboardEntry, LeaderboardQuery, UserBreakdown};
use crate::shared::{AppError, AppState};

#[derive(Debug, Serialize)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    pub offset: u32,
    pub limit: u32,
    /// Rows matching the filters before pagination
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct RerankResponse {
    pub entries_ranked: usize,
}

/// GET /users/:user_id/breakdown
///
/// Full component breakdown with a rank consistent with the served
/// scores. 404 for a user who has never been scored.
#[instrument(name = "get_breakdown", skip(state))]
pub async fn get_breakdown(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserBreakdown>, AppError> {
    let breakdown = state.leaderboard.breakdown(&user_id).await?;
    Ok(Json(breakdown))
}

/// GET /leaderboard?offset&limit&min_score&tier
#[instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardPage>, AppError> {
    let offset = query.offset() as u32;
    let limit = query.limit() as u32;
    let entries = state.leaderboard.page(&query).await?;
    let total = state.leaderboard.total(&query).await?;
    Ok(Json(LeaderboardPage {
        entries,
        offset,
        limit,
        total,
    }))
}

/// POST /leaderboard/rerank
///
/// Explicit global re-rank trigger for the periodic batch job
#[instrument(name = "trigger_rerank", skip(state))]
pub async fn trigger_rerank(
    State(state): State<AppState>,
) -> Result<Json<RerankResponse>, AppError> {
    let entries_ranked = state.leaderboard.rerank().await?;
    Ok(Json(RerankResponse { entries_ranked }))
}

/// POST /users/:user_id/refresh
///
/// Recomputes a user's components from current stats and external
/// signals; the way signal-only changes (profile edits, new resume,
/// application updates) enter the leaderboard without a game session.
#[instrument(name = "refresh_user", skip(state))]
pub async fn refresh_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserBreakdown>, AppError> {
    state.pipeline.refresh_user(&user_id).await?;
    let breakdown = state.leaderboard.breakdown(&user_id).await?;
    Ok(Json(breakdown))
}

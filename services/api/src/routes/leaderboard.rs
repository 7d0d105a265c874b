//! Public leaderboards: weekly voters and referrers, live and historic

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;

use common::week::current_week_window;

use crate::{error::ApiError, state::AppState};

/// Result size query
#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/voters", get(top_voters))
        .route("/voters/history", get(top_voter_history))
        .route("/referrers", get(top_referrers))
        .route("/referrers/history", get(top_referrer_history))
}

/// Most active voters of the running week
pub async fn top_voters(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (from, to) = current_week_window(Utc::now());
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let rows = state.stats_repository.top_voters(from, to, limit).await?;

    Ok(Json(rows))
}

/// Most successful referrers of the running week
pub async fn top_referrers(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (from, to) = current_week_window(Utc::now());
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let rows = state.stats_repository.top_referrers(from, to, limit).await?;

    Ok(Json(rows))
}

/// Past weekly voter podiums
pub async fn top_voter_history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(30).clamp(1, 300);

    let rows = state.stats_repository.top_voter_history(limit).await?;

    Ok(Json(rows))
}

/// Past weekly referrer podiums
pub async fn top_referrer_history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(30).clamp(1, 300);

    let rows = state.stats_repository.top_referrer_history(limit).await?;

    Ok(Json(rows))
}

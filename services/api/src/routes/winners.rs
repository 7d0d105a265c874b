//! Public winner listings

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Result size query
#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(recent_winners))
        .route("/contest/:id", get(contest_winners))
}

/// Recent podium entries across all contests
pub async fn recent_winners(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let winners = state.winner_repository.recent(limit).await?;

    Ok(Json(winners))
}

/// Podium for one contest
pub async fn contest_winners(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .contest_repository
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Contest"))?;

    let winners = state.winner_repository.by_contest(id).await?;

    Ok(Json(winners))
}

//! Admin competition management and the manual settlement trigger

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::ApiError, jobs::settlement, middleware::require_admin, models::CompetitionStatus,
    state::AppState,
};

/// Filters for the admin competition listing
#[derive(Deserialize)]
pub struct CompetitionListQuery {
    pub status: Option<CompetitionStatus>,
    pub contest_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_competitions))
        .route("/:id", get(get_competition).delete(delete_competition))
        .route("/determine-winners", post(determine_winners))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

/// List competitions with filters (admin)
pub async fn list_competitions(
    State(state): State<AppState>,
    Query(query): Query<CompetitionListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(25).clamp(1, 100);

    let (competitions, total) = state
        .competition_repository
        .list(query.status, query.contest_id, page, limit)
        .await?;

    Ok(Json(json!({
        "competitions": competitions,
        "page": page,
        "limit": limit,
        "total": total,
    })))
}

/// Get one competition (admin)
pub async fn get_competition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let competition = state
        .competition_repository
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Competition"))?;

    Ok(Json(competition))
}

/// Remove a competition and its votes (admin)
pub async fn delete_competition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.competition_repository.delete(id).await? {
        Ok(Json(json!({"message": "Competition deleted successfully"})))
    } else {
        Err(ApiError::NotFound("Competition"))
    }
}

/// Run the settlement pass immediately instead of waiting for the
/// scheduler (admin)
pub async fn determine_winners(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Settlement triggered manually");

    let summary = settlement::determine_winners(&state.db_pool).await?;

    Ok(Json(summary))
}

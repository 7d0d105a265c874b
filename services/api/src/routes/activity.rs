//! The caller's own competitions and votes

use axum::{
    Extension, Json, Router, extract::State, middleware, response::IntoResponse, routing::get,
};
use serde_json::json;

use crate::{
    error::ApiError,
    middleware::{AuthUser, require_auth},
    state::AppState,
};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_activity))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// Recent competitions entered and votes cast by the caller
pub async fn get_activity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let competitions = state
        .competition_repository
        .by_participant(auth.id, 50)
        .await?;
    let votes = state.vote_repository.recent_by_voter(auth.id, 50).await?;

    Ok(Json(json!({
        "competitions": competitions,
        "votes": votes,
    })))
}

//! In-app alerts

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::ApiError,
    middleware::{AuthUser, require_auth},
    state::AppState,
};

/// Result size query
#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_alerts))
        .route("/read-all", post(mark_all_read))
        .route("/:id/read", patch(mark_read))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// The caller's alerts, unread first
pub async fn list_alerts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);

    let alerts = state.alert_repository.for_user(auth.id, limit).await?;

    Ok(Json(alerts))
}

/// Mark one alert as read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if state.alert_repository.mark_read(auth.id, id).await? {
        Ok(Json(json!({"message": "Alert marked as read"})))
    } else {
        Err(ApiError::NotFound("Alert"))
    }
}

/// Mark all of the caller's alerts as read
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.alert_repository.mark_all_read(auth.id).await?;

    Ok(Json(json!({"updated": updated})))
}

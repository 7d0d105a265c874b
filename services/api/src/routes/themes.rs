//! Theme browsing and admin theme management

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::require_admin,
    models::{NewTheme, UpdateTheme},
    state::AppState,
};

pub fn router(state: AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/", post(create_theme))
        .route("/:id", patch(update_theme).delete(delete_theme))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/", get(list_themes))
        .route("/:id", get(get_theme))
        .merge(admin_routes)
}

/// List all themes
pub async fn list_themes(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let themes = state.theme_repository.list().await?;

    Ok(Json(themes))
}

/// Get a theme by ID
pub async fn get_theme(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let theme = state
        .theme_repository
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Theme"))?;

    Ok(Json(theme))
}

/// Create a theme (admin)
pub async fn create_theme(
    State(state): State<AppState>,
    Json(payload): Json<NewTheme>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Theme name is required".to_string()));
    }

    let theme = state.theme_repository.create(&payload).await?;

    Ok((StatusCode::CREATED, Json(theme)))
}

/// Update a theme (admin)
pub async fn update_theme(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTheme>,
) -> Result<impl IntoResponse, ApiError> {
    let theme = state
        .theme_repository
        .update(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Theme"))?;

    Ok(Json(theme))
}

/// Delete a theme (admin); themes still used by a contest are refused by
/// the foreign key
pub async fn delete_theme(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.theme_repository.delete(id).await? {
        Ok(Json(json!({"message": "Theme deleted successfully"})))
    } else {
        Err(ApiError::NotFound("Theme"))
    }
}

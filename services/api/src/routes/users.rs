//! User profile and admin user management

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{AuthUser, require_admin, require_auth},
    models::{ModerationUpdate, UpdateProfile},
    repositories::ProfileOutcome,
    state::AppState,
    validation::{validate_email, validate_username},
};

/// Pagination query for the admin listing
#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub fn router(state: AppState) -> Router<AppState> {
    let self_routes = Router::new()
        .route("/me", get(get_me).patch(update_me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .route("/", get(list_users))
        .route("/:id", patch(moderate_user).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    self_routes.merge(admin_routes)
}

/// Get the caller's profile
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_id(auth.id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(user))
}

/// Update the caller's username or email
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateProfile>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(username) = payload.username.as_deref() {
        validate_username(username).map_err(ApiError::BadRequest)?;
    }
    if let Some(email) = payload.email.as_deref() {
        validate_email(email).map_err(ApiError::BadRequest)?;
    }

    match state.user_repository.update_profile(auth.id, &payload).await? {
        ProfileOutcome::Updated(user) => Ok(Json(user)),
        ProfileOutcome::Duplicate => Err(ApiError::BadRequest(
            "Username or email is already taken".to_string(),
        )),
        ProfileOutcome::Missing => Err(ApiError::NotFound("User")),
    }
}

/// List all users (admin)
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(25).clamp(1, 100);

    let (users, total) = state.user_repository.list(page, limit).await?;

    Ok(Json(json!({
        "users": users,
        "page": page,
        "limit": limit,
        "total": total,
    })))
}

/// Update moderation flags on an account (admin)
pub async fn moderate_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModerationUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .set_moderation(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(user))
}

/// Delete an account (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.user_repository.delete(id).await? {
        Ok(Json(json!({"message": "User deleted successfully"})))
    } else {
        Err(ApiError::NotFound("User"))
    }
}

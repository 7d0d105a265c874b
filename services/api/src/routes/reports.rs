//! Image reports: filing and admin moderation

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{AuthUser, require_admin, require_auth},
    models::{NewReport, ReportStatus},
    state::AppState,
    validation::validate_report_categories,
};

/// Status filter for the admin report listing
#[derive(Deserialize)]
pub struct ReportListQuery {
    pub status: Option<ReportStatus>,
}

pub fn router(state: AppState) -> Router<AppState> {
    let user_routes = Router::new()
        .route("/", post(file_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .route("/", get(list_reports))
        .route("/:id/resolve", patch(resolve_report))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    user_routes.merge(admin_routes)
}

/// File a report against one image of a duel; the image disappears from
/// the voting feed until an admin resolves the report
pub async fn file_report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<NewReport>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.image_side != 1 && payload.image_side != 2 {
        return Err(ApiError::BadRequest(
            "Image side must be 1 or 2".to_string(),
        ));
    }
    validate_report_categories(&payload.categories).map_err(ApiError::BadRequest)?;

    state
        .competition_repository
        .find_by_id(payload.competition_id)
        .await?
        .ok_or(ApiError::NotFound("Competition"))?;

    let report = state.report_repository.file(auth.id, &payload).await?;

    Ok((StatusCode::CREATED, Json(report)))
}

/// List reports, optionally filtered by status (admin)
pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let reports = state.report_repository.list(query.status).await?;

    Ok(Json(reports))
}

/// Resolve an open report; the image returns to the feed unless another
/// open report still targets it (admin)
pub async fn resolve_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .report_repository
        .resolve(id)
        .await?
        .ok_or(ApiError::NotFound("Open report"))?;

    Ok(Json(report))
}

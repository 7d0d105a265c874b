//! Admin metrics dashboard

use axum::{Json, Router, extract::State, middleware, response::IntoResponse, routing::get};
use chrono::Utc;
use serde_json::json;

use common::week::current_week_window;

use crate::{error::ApiError, middleware::require_admin, state::AppState};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_metrics))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

/// Platform counters plus the recent weekly snapshots (admin)
pub async fn get_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let (from, to) = current_week_window(Utc::now());

    let overview = state.stats_repository.overview(from, to).await?;
    let weekly_voters = state.stats_repository.voter_stats(12).await?;
    let weekly_competitors = state.stats_repository.competitor_stats(12).await?;
    let weekly_reports = state.stats_repository.report_stats(12).await?;

    Ok(Json(json!({
        "overview": overview,
        "weekly_voters": weekly_voters,
        "weekly_competitors": weekly_competitors,
        "weekly_reports": weekly_reports,
    })))
}

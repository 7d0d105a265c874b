//! Contest browsing and admin contest management

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::require_admin,
    models::{ContestStatus, NewContest, UpdateContest},
    state::AppState,
};

/// Status filter for contest listings
#[derive(Deserialize)]
pub struct ContestListQuery {
    pub status: Option<ContestStatus>,
}

pub fn router(state: AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/", post(create_contest))
        .route("/:id", patch(update_contest).delete(delete_contest))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/", get(list_contests))
        .route("/:id", get(get_contest))
        .merge(admin_routes)
}

/// List contests, optionally filtered by status
pub async fn list_contests(
    State(state): State<AppState>,
    Query(query): Query<ContestListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let contests = state.contest_repository.list(query.status).await?;

    Ok(Json(contests))
}

/// Get a contest by ID
pub async fn get_contest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let contest = state
        .contest_repository
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Contest"))?;

    Ok(Json(contest))
}

/// Create a contest (admin)
pub async fn create_contest(
    State(state): State<AppState>,
    Json(payload): Json<NewContest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_schedule(&payload).map_err(ApiError::BadRequest)?;

    state
        .theme_repository
        .find_by_id(payload.theme_id)
        .await?
        .ok_or(ApiError::NotFound("Theme"))?;

    let contest = state.contest_repository.create(&payload).await?;

    Ok((StatusCode::CREATED, Json(contest)))
}

/// Update a contest (admin); moving it to `live` announces it to all users
pub async fn update_contest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateContest>,
) -> Result<impl IntoResponse, ApiError> {
    let before = state
        .contest_repository
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Contest"))?;

    let contest = state
        .contest_repository
        .update(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Contest"))?;

    if before.status != ContestStatus::Live && contest.status == ContestStatus::Live {
        let message = match state.theme_repository.find_by_id(contest.theme_id).await? {
            Some(theme) => format!("The {} contest is live! Enter now.", theme.name),
            None => "A new contest is live! Enter now.".to_string(),
        };
        let notified = state.alert_repository.broadcast(&message).await?;
        info!("Contest {} went live, notified {} users", contest.id, notified);
    }

    Ok(Json(contest))
}

/// Delete a contest (admin)
pub async fn delete_contest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.contest_repository.delete(id).await? {
        Ok(Json(json!({"message": "Contest deleted successfully"})))
    } else {
        Err(ApiError::NotFound("Contest"))
    }
}

/// Check the schedule is coherent before accepting a new contest
fn validate_schedule(contest: &NewContest) -> Result<(), String> {
    if contest.entry_fee < 0 {
        return Err("Entry fee cannot be negative".to_string());
    }

    if contest.first_prize < 0 || contest.second_prize < 0 || contest.third_prize < 0 {
        return Err("Prizes cannot be negative".to_string());
    }

    if contest.submission_opens_at >= contest.submission_closes_at {
        return Err("Submissions must open before they close".to_string());
    }

    if contest.voting_opens_at >= contest.voting_closes_at {
        return Err("Voting must open before it closes".to_string());
    }

    if contest.voting_closes_at < contest.submission_closes_at {
        return Err("Voting cannot close before submissions close".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn payload() -> NewContest {
        let open = Utc.with_ymd_and_hms(2025, 7, 7, 0, 0, 0).unwrap();
        NewContest {
            theme_id: Uuid::new_v4(),
            entry_fee: 5,
            prize_pool: 0,
            first_prize: 50,
            second_prize: 25,
            third_prize: 10,
            submission_opens_at: open,
            submission_closes_at: open + Duration::days(3),
            voting_opens_at: open,
            voting_closes_at: open + Duration::days(7),
        }
    }

    #[test]
    fn accepts_a_coherent_schedule() {
        assert!(validate_schedule(&payload()).is_ok());
    }

    #[test]
    fn rejects_inverted_windows() {
        let mut inverted = payload();
        inverted.submission_closes_at = inverted.submission_opens_at - Duration::hours(1);
        assert!(validate_schedule(&inverted).is_err());

        let mut closes_early = payload();
        closes_early.voting_closes_at = closes_early.submission_closes_at - Duration::hours(1);
        assert!(validate_schedule(&closes_early).is_err());
    }

    #[test]
    fn rejects_negative_amounts() {
        let mut negative_fee = payload();
        negative_fee.entry_fee = -1;
        assert!(validate_schedule(&negative_fee).is_err());

        let mut negative_prize = payload();
        negative_prize.third_prize = -10;
        assert!(validate_schedule(&negative_prize).is_err());
    }
}

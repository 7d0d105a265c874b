//! Public voting: cast votes and fetch the voting feed

use axum::{
    Json, Router,
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::optional_voter,
    models::CompetitionStatus,
    repositories::CastOutcome,
    state::AppState,
};

/// Request to cast a vote
#[derive(Deserialize)]
pub struct VoteRequest {
    pub competition_id: Uuid,
    pub selected_image_url: String,
}

/// Feed size query
#[derive(Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(cast_vote))
        .route("/entries", get(voting_entries))
}

/// Cast a vote for one image of a duel. Works with or without a token;
/// anonymous votes are recorded but never move the public tally.
pub async fn cast_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<VoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let voter = optional_voter(&headers, &state.jwt_service);

    let competition = state
        .competition_repository
        .find_by_id(payload.competition_id)
        .await?
        .ok_or(ApiError::NotFound("Competition"))?;

    if competition.status != CompetitionStatus::Active {
        return Err(ApiError::BadRequest(
            "Voting is not open for this competition".to_string(),
        ));
    }

    let contest = state
        .contest_repository
        .find_by_id(competition.contest_id)
        .await?
        .ok_or(ApiError::NotFound("Contest"))?;

    if !contest.accepts_votes(Utc::now()) {
        return Err(ApiError::BadRequest(
            "Voting is closed for this contest".to_string(),
        ));
    }

    let side = competition
        .side_of(&payload.selected_image_url)
        .ok_or(ApiError::InvalidSelection)?;

    if let Some(voter_id) = voter {
        if voter_id == competition.user1_id || Some(voter_id) == competition.user2_id {
            return Err(ApiError::BadRequest(
                "You cannot vote in your own duel".to_string(),
            ));
        }
    }

    let outcome = state
        .vote_repository
        .cast(competition.id, side, voter)
        .await?;

    match outcome {
        CastOutcome::Recorded => {
            let message = if voter.is_some() {
                "Vote recorded!"
            } else {
                "Vote recorded! Anonymous voting is limited to 3 votes."
            };
            Ok(Json(json!({"message": message})))
        }
        CastOutcome::AlreadyVoted => Err(ApiError::AlreadyVoted),
    }
}

/// Random sample of duels open for voting
pub async fn voting_entries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let voter = optional_voter(&headers, &state.jwt_service);
    let limit = query.limit.unwrap_or(5).clamp(1, 20);

    let entries = state
        .competition_repository
        .voting_entries(voter, limit)
        .await?;

    Ok(Json(entries))
}

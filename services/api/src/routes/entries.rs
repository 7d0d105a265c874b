//! Contest entry: random matchmaking and friend invites

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{AuthUser, require_auth},
    models::{CompetitionStatus, Contest, ContestStatus},
    repositories::EntryOutcome,
    state::AppState,
    validation::validate_image_url,
};

use super::generate_code;

/// Match preference when entering a contest
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    PickRandom,
    InviteFriend,
}

/// Request to enter a contest
#[derive(Deserialize)]
pub struct EntryRequest {
    pub contest_id: Uuid,
    pub image_url: String,
    pub mode: EntryMode,
}

/// Request to redeem an invite code
#[derive(Deserialize)]
pub struct JoinRequest {
    pub image_url: String,
}

pub fn router(state: AppState) -> Router<AppState> {
    let entry_routes = Router::new()
        .route("/", post(enter_contest))
        .route("/join/:code", post(join_invite))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    // Invite lookup stays public so the landing page can show the duel
    // before the invitee logs in.
    Router::new()
        .route("/invite/:code", get(get_invite))
        .merge(entry_routes)
}

/// Enter a contest, either joining the random matchmaking queue or
/// opening a duel slot reserved for a friend
pub async fn enter_contest(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<EntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_image_url(&payload.image_url).map_err(ApiError::BadRequest)?;
    let contest = open_contest(&state, payload.contest_id).await?;

    match payload.mode {
        EntryMode::PickRandom => {
            let outcome = state
                .competition_repository
                .enter_random(auth.id, &contest, &payload.image_url)
                .await?;

            match outcome {
                EntryOutcome::Matched(competition) => Ok((
                    StatusCode::CREATED,
                    Json(json!({
                        "message": "Matched with an opponent! Voting is now open.",
                        "competition": competition,
                    })),
                )),
                EntryOutcome::Waiting(competition) => Ok((
                    StatusCode::CREATED,
                    Json(json!({
                        "message": "Entry received! You'll be matched with the next entrant.",
                        "competition": competition,
                    })),
                )),
                EntryOutcome::InsufficientFunds => Err(ApiError::InsufficientFunds),
                EntryOutcome::SlotTaken => Err(ApiError::BadRequest(
                    "This duel already has two entrants".to_string(),
                )),
            }
        }
        EntryMode::InviteFriend => {
            let invite_code = generate_code(10);
            let outcome = state
                .competition_repository
                .create_invite(auth.id, &contest, &payload.image_url, &invite_code)
                .await?;

            match outcome {
                EntryOutcome::Waiting(competition) => Ok((
                    StatusCode::CREATED,
                    Json(json!({
                        "message": "Entry received! Share your invite code with a friend.",
                        "invite_code": invite_code,
                        "competition": competition,
                    })),
                )),
                EntryOutcome::InsufficientFunds => Err(ApiError::InsufficientFunds),
                _ => Err(ApiError::Internal(anyhow::anyhow!(
                    "unexpected outcome when opening an invite slot"
                ))),
            }
        }
    }
}

/// Look up an invite before redeeming it. Redeemed invites 404 so the
/// landing page treats them like expired links.
pub async fn get_invite(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let competition = state
        .competition_repository
        .find_by_invite_code(&code)
        .await?
        .ok_or(ApiError::NotFound("Invite"))?;

    if competition.status != CompetitionStatus::Waiting || competition.user2_id.is_some() {
        return Err(ApiError::NotFound("Invite"));
    }

    let contest = state
        .contest_repository
        .find_by_id(competition.contest_id)
        .await?
        .ok_or(ApiError::NotFound("Contest"))?;

    let inviter = state
        .user_repository
        .find_by_id(competition.user1_id)
        .await?
        .ok_or(ApiError::NotFound("Invite"))?;

    Ok(Json(json!({
        "contest_id": contest.id,
        "entry_fee": contest.entry_fee,
        "inviter": inviter.username,
        "voting_closes_at": contest.voting_closes_at,
    })))
}

/// Redeem an invite code and start the duel
pub async fn join_invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(code): Path<String>,
    Json(payload): Json<JoinRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_image_url(&payload.image_url).map_err(ApiError::BadRequest)?;

    let competition = state
        .competition_repository
        .find_by_invite_code(&code)
        .await?
        .ok_or(ApiError::NotFound("Invite"))?;

    if competition.user1_id == auth.id {
        return Err(ApiError::BadRequest(
            "You cannot join your own duel".to_string(),
        ));
    }
    if competition.status != CompetitionStatus::Waiting || competition.user2_id.is_some() {
        return Err(ApiError::BadRequest(
            "This duel already has two entrants".to_string(),
        ));
    }

    let contest = state
        .contest_repository
        .find_by_id(competition.contest_id)
        .await?
        .ok_or(ApiError::NotFound("Contest"))?;

    // Invites stay redeemable after submissions close, but not once the
    // contest stops running.
    if contest.status != ContestStatus::Live || Utc::now() >= contest.voting_closes_at {
        return Err(ApiError::BadRequest(
            "This contest is no longer accepting entries".to_string(),
        ));
    }

    let outcome = state
        .competition_repository
        .join_invite(auth.id, &contest, &code, &payload.image_url)
        .await?;

    match outcome {
        EntryOutcome::Matched(competition) => Ok(Json(json!({
            "message": "You're in! Voting is now open.",
            "competition": competition,
        }))),
        EntryOutcome::InsufficientFunds => Err(ApiError::InsufficientFunds),
        _ => Err(ApiError::BadRequest(
            "This duel already has two entrants".to_string(),
        )),
    }
}

/// Fetch the contest and check it is open for entries
async fn open_contest(state: &AppState, contest_id: Uuid) -> Result<Contest, ApiError> {
    let contest = state
        .contest_repository
        .find_by_id(contest_id)
        .await?
        .ok_or(ApiError::NotFound("Contest"))?;

    if !contest.accepts_entries(Utc::now()) {
        return Err(ApiError::BadRequest(
            "This contest is not accepting entries".to_string(),
        ));
    }

    Ok(contest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_mode_uses_snake_case() {
        let request: EntryRequest = serde_json::from_value(json!({
            "contest_id": Uuid::new_v4(),
            "image_url": "/uploads/me.jpg",
            "mode": "invite_friend",
        }))
        .unwrap();

        assert!(matches!(request.mode, EntryMode::InviteFriend));
        assert!(serde_json::from_value::<EntryMode>(json!("duel")).is_err());
    }
}

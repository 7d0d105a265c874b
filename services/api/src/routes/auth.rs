//! Registration and login

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::ApiError,
    models::{NewUser, User},
    repositories::RegisterOutcome,
    state::AppState,
    validation::{validate_email, validate_password, validate_username},
};

use super::generate_code;

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub referral_code: Option<String>,
}

/// Request for login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Response carrying a freshly issued token
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: User,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Register a new account; a valid referral code credits the referrer
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&payload.username).map_err(ApiError::BadRequest)?;
    validate_email(&payload.email).map_err(ApiError::BadRequest)?;
    validate_password(&payload.password).map_err(ApiError::BadRequest)?;

    let referred_by = match payload.referral_code.as_deref().filter(|c| !c.is_empty()) {
        Some(code) => {
            let referrer = state
                .user_repository
                .find_by_referral_code(code)
                .await?
                .ok_or_else(|| ApiError::BadRequest("Invalid referral code".to_string()))?;
            Some(referrer.id)
        }
        None => None,
    };

    let new_user = NewUser {
        username: payload.username,
        email: payload.email,
        password: payload.password,
        referral_code: generate_code(8),
        referred_by,
    };

    let outcome = state
        .user_repository
        .register(&new_user, state.signup_bonus, state.referral_bonus)
        .await?;

    let user = match outcome {
        RegisterOutcome::Created(user) => user,
        RegisterOutcome::Duplicate => {
            return Err(ApiError::BadRequest(
                "Username or email is already registered".to_string(),
            ));
        }
    };

    let token = state.jwt_service.generate_token(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: state.jwt_service.token_expiry(),
            user,
        }),
    ))
}

/// Exchange credentials for a token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_username_or_email(&payload.username_or_email)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !state.user_repository.verify_password(&user, &payload.password)? {
        return Err(ApiError::Unauthorized);
    }

    if user.is_banned {
        return Err(ApiError::Forbidden("Account is banned".to_string()));
    }
    if user.is_suspended {
        return Err(ApiError::Forbidden("Account is suspended".to_string()));
    }

    info!("User logged in: {} ({})", user.username, user.role.as_str());

    let token = state.jwt_service.generate_token(&user)?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.token_expiry(),
        user,
    }))
}

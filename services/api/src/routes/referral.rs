//! Referral program: code, referred users and bonus total

use axum::{
    Extension, Json, Router, extract::State, middleware, response::IntoResponse, routing::get,
};
use serde_json::json;

use crate::{
    error::ApiError,
    middleware::{AuthUser, require_auth},
    models::WalletEntryType,
    state::AppState,
};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_referral_overview))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// The caller's referral code, everyone who used it and the tokens earned
pub async fn get_referral_overview(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_id(auth.id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    let referred = state.user_repository.referred_users(auth.id).await?;
    let bonus_earned = state
        .wallet_repository
        .sum_of_type(auth.id, WalletEntryType::ReferralBonus)
        .await?;

    Ok(Json(json!({
        "referral_code": user.referral_code,
        "referred": referred,
        "bonus_earned": bonus_earned,
    })))
}

//! Wallet balance and ledger

use axum::{
    Extension, Json, Router, extract::State, middleware, response::IntoResponse, routing::get,
};
use serde_json::json;

use crate::{
    error::ApiError,
    middleware::{AuthUser, require_auth},
    state::AppState,
};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_wallet))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// The caller's balance and recent ledger entries
pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let wallet = state
        .wallet_repository
        .find_by_user(auth.id)
        .await?
        .ok_or(ApiError::NotFound("Wallet"))?;

    let entries = state.wallet_repository.entries(auth.id, 50).await?;

    Ok(Json(json!({
        "balance": wallet.balance,
        "entries": entries,
    })))
}

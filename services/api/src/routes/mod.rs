//! HTTP routes for the contest service

use axum::{Json, Router, response::IntoResponse, routing::get, routing::post};
use rand::{Rng, distributions::Alphanumeric};
use serde_json::json;
use tower_http::services::ServeDir;

use crate::state::AppState;

mod activity;
mod alerts;
mod auth;
mod competitions;
mod contests;
mod entries;
mod leaderboard;
mod metrics;
mod referral;
mod reports;
mod themes;
mod users;
mod votes;
mod wallet;
mod webhook;
mod winners;

/// Create the router for the contest service
pub fn create_router(state: AppState, uploads_dir: &str) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhook", post(webhook::deployment_webhook))
        .nest("/api/auth", auth::router())
        .nest("/api/users", users::router(state.clone()))
        .nest("/api/themes", themes::router(state.clone()))
        .nest("/api/contests", contests::router(state.clone()))
        .nest("/api/competitions", competitions::router(state.clone()))
        .nest("/api/competition-entry", entries::router(state.clone()))
        .nest("/api/vote", votes::router())
        .nest("/api/wallet", wallet::router(state.clone()))
        .nest("/api/referral", referral::router(state.clone()))
        .nest("/api/activity", activity::router(state.clone()))
        .nest("/api/alerts", alerts::router(state.clone()))
        .nest("/api/reports", reports::router(state.clone()))
        .nest("/api/leaderboard", leaderboard::router())
        .nest("/api/winners", winners::router())
        .nest("/api/metrics", metrics::router(state.clone()))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "contest-service"
    }))
}

/// Random alphanumeric code for referrals and duel invites
pub(crate) fn generate_code(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_alphanumeric_and_sized() {
        let code = generate_code(10);

        assert_eq!(code.len(), 10);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_codes_differ() {
        assert_ne!(generate_code(10), generate_code(10));
    }
}

//! Deployment webhook with HMAC-SHA256 signature verification

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tracing::{info, warn};

use crate::{error::ApiError, state::AppState};

type HmacSha256 = Hmac<Sha256>;

/// Accept a deployment notification signed with the shared webhook
/// secret, in the `X-Hub-Signature-256: sha256=<hex>` convention
pub async fn deployment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if state.webhook_secret.is_empty() {
        warn!("Deployment webhook rejected: no secret configured");
        return Err(ApiError::Unauthorized);
    }

    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    if !verify_signature(state.webhook_secret.as_bytes(), &body, signature) {
        warn!("Deployment webhook rejected: signature mismatch");
        return Err(ApiError::Unauthorized);
    }

    info!("Deployment webhook accepted ({} byte payload)", body.len());

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"message": "Webhook received"})),
    ))
}

/// Check an `sha256=<hex>` signature against the payload in constant time
fn verify_signature(secret: &[u8], payload: &[u8], signature_header: &str) -> bool {
    let Some(hex_digest) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(provided) = hex::decode(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };

    mac.update(payload);
    mac.verify_slice(&provided).is_ok()
}

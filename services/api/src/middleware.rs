//! Authentication middleware for JWT-protected routes

use axum::{
    RequestExt,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use uuid::Uuid;

use crate::{error::ApiError, jwt::JwtService, models::UserRole, state::AppState};

/// Authenticated user information attached to the request
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: UserRole,
}

/// Require a valid token from an account in good standing
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, &mut req).await?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Require a valid token from an admin account
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, &mut req).await?;
    if user.role != UserRole::Admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Validate the bearer token and re-check the account flags, so bans and
/// suspensions take effect before issued tokens expire
async fn authenticate(state: &AppState, req: &mut Request) -> Result<AuthUser, ApiError> {
    let TypedHeader(Authorization(bearer)) = req
        .extract_parts::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| ApiError::Unauthorized)?;

    let claims = state
        .jwt_service
        .validate_token(bearer.token())
        .map_err(|_| ApiError::Unauthorized)?;

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if user.is_banned {
        return Err(ApiError::Forbidden("Account is banned".to_string()));
    }
    if user.is_suspended {
        return Err(ApiError::Forbidden("Account is suspended".to_string()));
    }

    Ok(AuthUser {
        id: user.id,
        role: user.role,
    })
}

/// Voter identity for endpoints that also accept anonymous traffic: a
/// valid bearer token yields the user ID, anything else counts as
/// anonymous rather than an error
pub fn optional_voter(headers: &HeaderMap, jwt_service: &JwtService) -> Option<Uuid> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let token = header.strip_prefix("Bearer ")?;

    jwt_service
        .validate_token(token)
        .ok()
        .map(|claims| claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;
    use common::config::AuthConfig;

    use crate::models::User;

    fn service() -> JwtService {
        JwtService::new(&AuthConfig {
            jwt_secret: "middleware-test-secret".to_string(),
            token_expiry_secs: 600,
        })
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn optional_voter_accepts_valid_bearer() {
        let jwt = service();
        let user = User {
            id: Uuid::new_v4(),
            username: "vera".into(),
            email: "vera@example.com".into(),
            password_hash: String::new(),
            role: UserRole::Participant,
            referral_code: "REF123".into(),
            referred_by: None,
            is_verified: false,
            is_suspended: false,
            is_banned: false,
            is_seed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let token = jwt.generate_token(&user).unwrap();

        let voter = optional_voter(&headers_with(&format!("Bearer {token}")), &jwt);

        assert_eq!(voter, Some(user.id));
    }

    #[test]
    fn optional_voter_treats_garbage_as_anonymous() {
        let jwt = service();

        assert_eq!(optional_voter(&HeaderMap::new(), &jwt), None);
        assert_eq!(optional_voter(&headers_with("Bearer junk"), &jwt), None);
        assert_eq!(optional_voter(&headers_with("Basic abc"), &jwt), None);
    }
}

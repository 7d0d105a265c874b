//! JWT issuing and validation
//!
//! Tokens are signed with HS256 using the shared secret from the
//! configuration. A token carries the user ID and role so the
//! middleware can gate admin routes without a database read.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use common::config::AuthConfig;

use crate::models::{User, UserRole};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Account role at issue time
    pub role: UserRole,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service from the auth configuration
    pub fn new(config: &AuthConfig) -> Self {
        JwtService {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation: Validation::default(),
            token_expiry: config.token_expiry_secs,
        }
    }

    /// Generate a token for a user
    pub fn generate_token(&self, user: &User) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now,
            exp: now + self.token_expiry,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Lifetime of freshly issued tokens, in seconds
    pub fn token_expiry(&self) -> u64 {
        self.token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn service(secret: &str) -> JwtService {
        JwtService::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            token_expiry_secs: 3600,
        })
    }

    fn sample_user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            username: "ansel".into(),
            email: "ansel@example.com".into(),
            password_hash: String::new(),
            role,
            referral_code: "AB12CD34".into(),
            referred_by: None,
            is_verified: true,
            is_suspended: false,
            is_banned: false,
            is_seed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let service = service("test-secret");
        let user = sample_user(UserRole::Admin);

        let token = service.generate_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = service("test-secret");
        let token = service.generate_token(&sample_user(UserRole::Participant)).unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

        assert!(service.validate_token(&tampered).is_err());
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let issuer = service("secret-one");
        let verifier = service("secret-two");

        let token = issuer.generate_token(&sample_user(UserRole::Participant)).unwrap();

        assert!(verifier.validate_token(&token).is_err());
    }
}

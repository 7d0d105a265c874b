//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account role, stored as the `user_role` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Participant,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Participant => "participant",
            UserRole::Admin => "admin",
        }
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub referral_code: String,
    pub referred_by: Option<Uuid>,
    pub is_verified: bool,
    pub is_suspended: bool,
    pub is_banned: bool,
    pub is_seed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user creation payload; the repository hashes the password
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub referral_code: String,
    pub referred_by: Option<Uuid>,
}

/// Self-service profile update payload
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateProfile {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Admin moderation payload; absent fields are left untouched
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ModerationUpdate {
    pub is_verified: Option<bool>,
    pub is_suspended: Option<bool>,
    pub is_banned: Option<bool>,
    pub is_seed: Option<bool>,
}

/// Row in the caller's referral listing
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReferredUser {
    pub username: String,
    pub joined_at: DateTime<Utc>,
}

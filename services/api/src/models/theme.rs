//! Theme model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Theme entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Theme {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New theme creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewTheme {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Theme update payload
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateTheme {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

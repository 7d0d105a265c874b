//! Contest winner records

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Podium entry joined with its user and theme for display
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WinnerRecord {
    pub id: Uuid,
    pub contest_id: Uuid,
    pub competition_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub theme_name: String,
    pub position: i16,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

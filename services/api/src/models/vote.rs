//! Vote activity model
//!
//! Vote rows themselves are written and tallied entirely inside SQL; only
//! the joined activity view crosses into Rust.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Row in the caller's recent voting activity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VoteActivity {
    pub competition_id: Uuid,
    pub contest_id: Uuid,
    pub theme_name: String,
    pub side: i16,
    pub created_at: DateTime<Utc>,
}

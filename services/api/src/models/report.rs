//! Image report model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Moderation state, stored as the `report_status` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Open,
    Resolved,
}

/// Report entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub competition_id: Uuid,
    pub reporter_id: Option<Uuid>,
    pub image_side: i16,
    pub categories: Vec<String>,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

/// New report payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
    pub competition_id: Uuid,
    pub image_side: i16,
    #[serde(default)]
    pub categories: Vec<String>,
    pub description: Option<String>,
}

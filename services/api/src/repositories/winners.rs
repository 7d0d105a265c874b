//! Winner repository for podium listings

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::WinnerRecord;

/// Winner repository
#[derive(Clone)]
pub struct WinnerRepository {
    pool: PgPool,
}

impl WinnerRepository {
    /// Create a new winner repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recent podium entries across all contests
    pub async fn recent(&self, limit: i64) -> Result<Vec<WinnerRecord>> {
        let winners = sqlx::query_as::<_, WinnerRecord>(
            r#"
            SELECT w.id, w.contest_id, w.competition_id, w.user_id,
                   u.username, t.name AS theme_name, w.position, w.amount, w.created_at
            FROM winners w
            JOIN users u ON u.id = w.user_id
            JOIN contests ct ON ct.id = w.contest_id
            JOIN themes t ON t.id = ct.theme_id
            ORDER BY w.created_at DESC, w.position
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(winners)
    }

    /// Podium for one contest, first place first
    pub async fn by_contest(&self, contest_id: Uuid) -> Result<Vec<WinnerRecord>> {
        let winners = sqlx::query_as::<_, WinnerRecord>(
            r#"
            SELECT w.id, w.contest_id, w.competition_id, w.user_id,
                   u.username, t.name AS theme_name, w.position, w.amount, w.created_at
            FROM winners w
            JOIN users u ON u.id = w.user_id
            JOIN contests ct ON ct.id = w.contest_id
            JOIN themes t ON t.id = ct.theme_id
            WHERE w.contest_id = $1
            ORDER BY w.position
            "#,
        )
        .bind(contest_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(winners)
    }
}

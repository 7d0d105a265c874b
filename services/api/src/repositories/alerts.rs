//! Alert repository for in-app notifications

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Alert;

/// Alert repository
#[derive(Clone)]
pub struct AlertRepository {
    pool: PgPool,
}

impl AlertRepository {
    /// Create a new alert repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Alerts for a user, unread first, then newest first
    pub async fn for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Alert>> {
        let alerts = sqlx::query_as::<_, Alert>(
            r#"
            SELECT * FROM alerts
            WHERE user_id = $1
            ORDER BY is_read, created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(alerts)
    }

    /// Queue the same alert for every user; returns how many were created
    pub async fn broadcast(&self, message: &str) -> Result<u64> {
        let result = sqlx::query("INSERT INTO alerts (user_id, message) SELECT id, $1 FROM users")
            .bind(message)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Mark one of the user's alerts as read
    pub async fn mark_read(&self, user_id: Uuid, alert_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE alerts SET is_read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(alert_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark all of the user's alerts as read; returns how many flipped
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result =
            sqlx::query("UPDATE alerts SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}

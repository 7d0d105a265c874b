//! Contest repository for database operations

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{Contest, ContestStatus, NewContest, UpdateContest};

/// Contest repository
#[derive(Clone)]
pub struct ContestRepository {
    pool: PgPool,
}

impl ContestRepository {
    /// Create a new contest repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new contest in the `upcoming` state
    pub async fn create(&self, new_contest: &NewContest) -> Result<Contest> {
        info!("Creating contest for theme: {}", new_contest.theme_id);

        let contest = sqlx::query_as::<_, Contest>(
            r#"
            INSERT INTO contests (
                theme_id, entry_fee, prize_pool, first_prize, second_prize, third_prize,
                submission_opens_at, submission_closes_at, voting_opens_at, voting_closes_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(new_contest.theme_id)
        .bind(new_contest.entry_fee)
        .bind(new_contest.prize_pool)
        .bind(new_contest.first_prize)
        .bind(new_contest.second_prize)
        .bind(new_contest.third_prize)
        .bind(new_contest.submission_opens_at)
        .bind(new_contest.submission_closes_at)
        .bind(new_contest.voting_opens_at)
        .bind(new_contest.voting_closes_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(contest)
    }

    /// List contests, optionally filtered by status, soonest deadline first
    pub async fn list(&self, status: Option<ContestStatus>) -> Result<Vec<Contest>> {
        let contests = sqlx::query_as::<_, Contest>(
            r#"
            SELECT * FROM contests
            WHERE $1::contest_status IS NULL OR status = $1
            ORDER BY voting_closes_at
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(contests)
    }

    /// Find a contest by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>("SELECT * FROM contests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(contest)
    }

    /// Update a contest; absent fields are left untouched
    pub async fn update(&self, id: Uuid, update: &UpdateContest) -> Result<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>(
            r#"
            UPDATE contests
            SET theme_id = COALESCE($2, theme_id),
                status = COALESCE($3, status),
                entry_fee = COALESCE($4, entry_fee),
                prize_pool = COALESCE($5, prize_pool),
                first_prize = COALESCE($6, first_prize),
                second_prize = COALESCE($7, second_prize),
                third_prize = COALESCE($8, third_prize),
                submission_opens_at = COALESCE($9, submission_opens_at),
                submission_closes_at = COALESCE($10, submission_closes_at),
                voting_opens_at = COALESCE($11, voting_opens_at),
                voting_closes_at = COALESCE($12, voting_closes_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.theme_id)
        .bind(update.status)
        .bind(update.entry_fee)
        .bind(update.prize_pool)
        .bind(update.first_prize)
        .bind(update.second_prize)
        .bind(update.third_prize)
        .bind(update.submission_opens_at)
        .bind(update.submission_closes_at)
        .bind(update.voting_opens_at)
        .bind(update.voting_closes_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contest)
    }

    /// Delete a contest and, via cascade, its competitions and votes
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        info!("Deleting contest: {}", id);

        let result = sqlx::query("DELETE FROM contests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

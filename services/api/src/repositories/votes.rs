//! Vote repository for database operations

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::VoteActivity;

/// Outcome of a cast vote
pub enum CastOutcome {
    Recorded,
    AlreadyVoted,
}

/// Vote repository
#[derive(Clone)]
pub struct VoteRepository {
    pool: PgPool,
}

impl VoteRepository {
    /// Create a new vote repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a vote. Authenticated votes are deduplicated by the partial
    /// unique index and bump the public tally; anonymous votes are stored
    /// for the record but never counted.
    pub async fn cast(
        &self,
        competition_id: Uuid,
        side: i16,
        voter_id: Option<Uuid>,
    ) -> Result<CastOutcome> {
        let Some(voter) = voter_id else {
            sqlx::query("INSERT INTO votes (competition_id, side) VALUES ($1, $2)")
                .bind(competition_id)
                .bind(side)
                .execute(&self.pool)
                .await?;

            return Ok(CastOutcome::Recorded);
        };

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO votes (competition_id, voter_id, side)
            VALUES ($1, $2, $3)
            ON CONFLICT (competition_id, voter_id) WHERE voter_id IS NOT NULL
            DO NOTHING
            "#,
        )
        .bind(competition_id)
        .bind(voter)
        .bind(side)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(CastOutcome::AlreadyVoted);
        }

        sqlx::query(
            r#"
            UPDATE competitions
            SET votes_user1 = votes_user1 + CASE WHEN $2 = 1 THEN 1 ELSE 0 END,
                votes_user2 = votes_user2 + CASE WHEN $2 = 2 THEN 1 ELSE 0 END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(competition_id)
        .bind(side)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CastOutcome::Recorded)
    }

    /// The caller's recent votes joined with their contest and theme
    pub async fn recent_by_voter(&self, voter_id: Uuid, limit: i64) -> Result<Vec<VoteActivity>> {
        let votes = sqlx::query_as::<_, VoteActivity>(
            r#"
            SELECT v.competition_id, c.contest_id, t.name AS theme_name, v.side, v.created_at
            FROM votes v
            JOIN competitions c ON c.id = v.competition_id
            JOIN contests ct ON ct.id = c.contest_id
            JOIN themes t ON t.id = ct.theme_id
            WHERE v.voter_id = $1
            ORDER BY v.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(voter_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sqlx::Row;

    use common::{
        config::AppConfig,
        database::{init_pool, run_migrations},
    };

    async fn test_pool() -> Result<PgPool> {
        let config = AppConfig::load()?;
        let pool = init_pool(&config.database).await?;
        run_migrations(&pool).await?;
        Ok(pool)
    }

    async fn insert_user(pool: &PgPool, suffix: &str, tag: &str) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, email, password_hash, referral_code)
            VALUES ($1, $2, 'x', $3)
            RETURNING id
            "#,
        )
        .bind(format!("{tag}_{suffix}"))
        .bind(format!("{tag}_{suffix}@example.com"))
        .bind(format!("{tag}{suffix}"))
        .fetch_one(pool)
        .await?;

        sqlx::query("INSERT INTO wallets (user_id, balance) VALUES ($1, 100)")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(id)
    }

    async fn tallies(pool: &PgPool, competition_id: Uuid) -> Result<(i64, i64)> {
        let row = sqlx::query("SELECT votes_user1, votes_user2 FROM competitions WHERE id = $1")
            .bind(competition_id)
            .fetch_one(pool)
            .await?;

        Ok((row.get("votes_user1"), row.get("votes_user2")))
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn counts_each_voter_once_and_keeps_anonymous_off_the_tally() -> Result<()> {
        let pool = test_pool().await?;
        let suffix = Uuid::new_v4().simple().to_string();

        let user1 = insert_user(&pool, &suffix, "left").await?;
        let user2 = insert_user(&pool, &suffix, "right").await?;
        let fan1 = insert_user(&pool, &suffix, "fan1").await?;
        let fan2 = insert_user(&pool, &suffix, "fan2").await?;

        let theme_id: Uuid = sqlx::query_scalar("INSERT INTO themes (name) VALUES ($1) RETURNING id")
            .bind(format!("Vote theme {suffix}"))
            .fetch_one(&pool)
            .await?;

        let contest_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO contests (theme_id, status, entry_fee,
                                  first_prize, second_prize, third_prize,
                                  submission_opens_at, submission_closes_at,
                                  voting_opens_at, voting_closes_at)
            VALUES ($1, 'live', 5, 20, 10, 5,
                    NOW() - INTERVAL '3 days', NOW() - INTERVAL '2 days',
                    NOW() - INTERVAL '2 days', NOW() + INTERVAL '1 day')
            RETURNING id
            "#,
        )
        .bind(theme_id)
        .fetch_one(&pool)
        .await?;

        let competition_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO competitions (contest_id, status, user1_id, user2_id,
                                      image1_url, image2_url, matched_at)
            VALUES ($1, 'active', $2, $3, '/uploads/a.jpg', '/uploads/b.jpg', NOW())
            RETURNING id
            "#,
        )
        .bind(contest_id)
        .bind(user1)
        .bind(user2)
        .fetch_one(&pool)
        .await?;

        let repo = VoteRepository::new(pool.clone());

        // First authenticated vote lands on the public tally
        let first = repo.cast(competition_id, 1, Some(fan1)).await?;
        assert!(matches!(first, CastOutcome::Recorded));
        assert_eq!(tallies(&pool, competition_id).await?, (1, 0));

        // The same voter cannot move the tally again, not even for the
        // other side
        let second = repo.cast(competition_id, 2, Some(fan1)).await?;
        assert!(matches!(second, CastOutcome::AlreadyVoted));
        assert_eq!(tallies(&pool, competition_id).await?, (1, 0));

        // Anonymous votes are stored but never counted
        let anonymous = repo.cast(competition_id, 2, None).await?;
        assert!(matches!(anonymous, CastOutcome::Recorded));
        assert_eq!(tallies(&pool, competition_id).await?, (1, 0));

        let other = repo.cast(competition_id, 2, Some(fan2)).await?;
        assert!(matches!(other, CastOutcome::Recorded));

        // The tally adds up to the authenticated rows; the anonymous vote
        // only shows in the raw count
        let (votes_user1, votes_user2) = tallies(&pool, competition_id).await?;
        assert_eq!((votes_user1, votes_user2), (1, 1));

        let authenticated: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM votes WHERE competition_id = $1 AND voter_id IS NOT NULL",
        )
        .bind(competition_id)
        .fetch_one(&pool)
        .await?;
        assert_eq!(votes_user1 + votes_user2, authenticated);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE competition_id = $1")
            .bind(competition_id)
            .fetch_one(&pool)
            .await?;
        assert_eq!(total, 3);

        Ok(())
    }
}

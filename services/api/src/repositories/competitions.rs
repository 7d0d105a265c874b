//! Competition repository: matchmaking, invites and the voting feed

use anyhow::Result;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::models::{Competition, CompetitionStatus, Contest, VotingEntry, WalletEntryType};

/// Outcome of a paid contest entry
pub enum EntryOutcome {
    /// Entry claimed an open slot; the duel is live
    Matched(Competition),
    /// Entry opened a new slot and waits for an opponent
    Waiting(Competition),
    /// The entry fee exceeds the wallet balance; nothing was written
    InsufficientFunds,
    /// The targeted invite slot was taken concurrently; nothing was written
    SlotTaken,
}

/// Competition repository
#[derive(Clone)]
pub struct CompetitionRepository {
    pool: PgPool,
}

impl CompetitionRepository {
    /// Create a new competition repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enter the random-matchmaking queue: debit the fee, then claim the
    /// oldest open slot or open a new one. The claim takes a row lock with
    /// SKIP LOCKED so two concurrent entrants can never land in the same
    /// slot.
    pub async fn enter_random(
        &self,
        user_id: Uuid,
        contest: &Contest,
        image_url: &str,
    ) -> Result<EntryOutcome> {
        let mut tx = self.pool.begin().await?;

        if !debit_entry_fee(&mut tx, user_id, contest).await? {
            tx.rollback().await?;
            return Ok(EntryOutcome::InsufficientFunds);
        }

        let claimed = sqlx::query_as::<_, Competition>(
            r#"
            UPDATE competitions
            SET user2_id = $1,
                image2_url = $2,
                status = 'active',
                matched_at = NOW(),
                updated_at = NOW()
            WHERE id = (
                SELECT id FROM competitions
                WHERE contest_id = $3
                  AND status = 'waiting'
                  AND user2_id IS NULL
                  AND invite_code IS NULL
                  AND user1_id <> $1
                ORDER BY created_at
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(image_url)
        .bind(contest.id)
        .fetch_optional(&mut *tx)
        .await?;

        match claimed {
            Some(competition) => {
                notify(
                    &mut tx,
                    competition.user1_id,
                    "An opponent joined your duel! Voting is now open.",
                )
                .await?;
                tx.commit().await?;

                info!("Matched duel {} in contest {}", competition.id, contest.id);
                Ok(EntryOutcome::Matched(competition))
            }
            None => {
                let competition = sqlx::query_as::<_, Competition>(
                    r#"
                    INSERT INTO competitions (contest_id, user1_id, image1_url)
                    VALUES ($1, $2, $3)
                    RETURNING *
                    "#,
                )
                .bind(contest.id)
                .bind(user_id)
                .bind(image_url)
                .fetch_one(&mut *tx)
                .await?;
                tx.commit().await?;

                Ok(EntryOutcome::Waiting(competition))
            }
        }
    }

    /// Open an invite-only slot reserved for whoever redeems the code
    pub async fn create_invite(
        &self,
        user_id: Uuid,
        contest: &Contest,
        image_url: &str,
        invite_code: &str,
    ) -> Result<EntryOutcome> {
        let mut tx = self.pool.begin().await?;

        if !debit_entry_fee(&mut tx, user_id, contest).await? {
            tx.rollback().await?;
            return Ok(EntryOutcome::InsufficientFunds);
        }

        let competition = sqlx::query_as::<_, Competition>(
            r#"
            INSERT INTO competitions (contest_id, user1_id, image1_url, invite_code)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(contest.id)
        .bind(user_id)
        .bind(image_url)
        .bind(invite_code)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        info!("Opened invite duel {} in contest {}", competition.id, contest.id);
        Ok(EntryOutcome::Waiting(competition))
    }

    /// Redeem an invite code. The slot is claimed with a guarded update, so
    /// losing a race against another redeemer reports `SlotTaken` instead of
    /// double-filling the duel.
    pub async fn join_invite(
        &self,
        user_id: Uuid,
        contest: &Contest,
        invite_code: &str,
        image_url: &str,
    ) -> Result<EntryOutcome> {
        let mut tx = self.pool.begin().await?;

        if !debit_entry_fee(&mut tx, user_id, contest).await? {
            tx.rollback().await?;
            return Ok(EntryOutcome::InsufficientFunds);
        }

        let claimed = sqlx::query_as::<_, Competition>(
            r#"
            UPDATE competitions
            SET user2_id = $1,
                image2_url = $2,
                status = 'active',
                matched_at = NOW(),
                updated_at = NOW()
            WHERE invite_code = $3
              AND status = 'waiting'
              AND user2_id IS NULL
              AND user1_id <> $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(image_url)
        .bind(invite_code)
        .fetch_optional(&mut *tx)
        .await?;

        match claimed {
            Some(competition) => {
                notify(
                    &mut tx,
                    competition.user1_id,
                    "Your invited opponent joined! Voting is now open.",
                )
                .await?;
                tx.commit().await?;

                Ok(EntryOutcome::Matched(competition))
            }
            None => {
                tx.rollback().await?;
                Ok(EntryOutcome::SlotTaken)
            }
        }
    }

    /// Find a competition by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Competition>> {
        let competition =
            sqlx::query_as::<_, Competition>("SELECT * FROM competitions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(competition)
    }

    /// Find a competition by its invite code
    pub async fn find_by_invite_code(&self, code: &str) -> Result<Option<Competition>> {
        let competition =
            sqlx::query_as::<_, Competition>("SELECT * FROM competitions WHERE invite_code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        Ok(competition)
    }

    /// List competitions with optional filters, newest first, plus the total
    /// count for pagination
    pub async fn list(
        &self,
        status: Option<CompetitionStatus>,
        contest_id: Option<Uuid>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Competition>, i64)> {
        let offset = (page - 1).max(0) * per_page;

        let competitions = sqlx::query_as::<_, Competition>(
            r#"
            SELECT * FROM competitions
            WHERE ($1::competition_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR contest_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(contest_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM competitions
            WHERE ($1::competition_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR contest_id = $2)
            "#,
        )
        .bind(status)
        .bind(contest_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((competitions, total))
    }

    /// Competitions the user takes part in, newest first
    pub async fn by_participant(&self, user_id: Uuid, limit: i64) -> Result<Vec<Competition>> {
        let competitions = sqlx::query_as::<_, Competition>(
            r#"
            SELECT * FROM competitions
            WHERE user1_id = $1 OR user2_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(competitions)
    }

    /// Random sample of duels the caller may vote on: live contest inside
    /// its voting window, no flagged image, not the caller's own duel and
    /// not one they already voted in. Anonymous callers only skip the
    /// flagged and inactive ones.
    pub async fn voting_entries(
        &self,
        voter_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<VotingEntry>> {
        let entries = sqlx::query_as::<_, VotingEntry>(
            r#"
            SELECT c.id, c.contest_id, t.name AS theme_name,
                   c.image1_url, c.image2_url, ct.voting_closes_at
            FROM competitions c
            JOIN contests ct ON ct.id = c.contest_id
            JOIN themes t ON t.id = ct.theme_id
            WHERE c.status = 'active'
              AND c.image2_url IS NOT NULL
              AND ct.status = 'live'
              AND NOW() >= ct.voting_opens_at
              AND NOW() < ct.voting_closes_at
              AND NOT c.image1_flagged
              AND NOT c.image2_flagged
              AND ($1::uuid IS NULL OR (c.user1_id <> $1 AND c.user2_id <> $1))
              AND NOT EXISTS (
                  SELECT 1 FROM votes v
                  WHERE v.competition_id = c.id AND v.voter_id = $1
              )
            ORDER BY random()
            LIMIT $2
            "#,
        )
        .bind(voter_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Delete a competition and, via cascade, its votes and reports
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        info!("Deleting competition: {}", id);

        let result = sqlx::query("DELETE FROM competitions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Debit the contest entry fee and write the matching ledger entry.
/// Returns false without writing anything when the balance is short.
async fn debit_entry_fee(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    contest: &Contest,
) -> Result<bool> {
    if contest.entry_fee == 0 {
        return Ok(true);
    }

    let debited = sqlx::query(
        r#"
        UPDATE wallets
        SET balance = balance - $2, updated_at = NOW()
        WHERE user_id = $1 AND balance >= $2
        "#,
    )
    .bind(user_id)
    .bind(contest.entry_fee)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    if debited == 0 {
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO wallet_entries (user_id, entry_type, amount, description)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(WalletEntryType::EntryFee)
    .bind(-contest.entry_fee)
    .bind(format!("Entry fee for contest {}", contest.id))
    .execute(&mut **tx)
    .await?;

    Ok(true)
}

/// Queue an in-app alert inside the caller's transaction
async fn notify(tx: &mut Transaction<'_, Postgres>, user_id: Uuid, message: &str) -> Result<()> {
    sqlx::query("INSERT INTO alerts (user_id, message) VALUES ($1, $2)")
        .bind(user_id)
        .bind(message)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

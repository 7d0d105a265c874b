//! Winner determination for duels whose voting window has closed, followed
//! by podium ranking for the contests those duels belong to

use anyhow::Result;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Row};
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{CompetitionStatus, WalletEntryType};

use super::{credit, notify};

/// What a settlement pass accomplished
#[derive(Debug, Default, Serialize)]
pub struct SettlementSummary {
    pub competitions_settled: u64,
    pub contests_ranked: u64,
    pub tokens_paid: i64,
}

#[derive(Debug, FromRow)]
struct DueCompetition {
    id: Uuid,
    status: CompetitionStatus,
    user1_id: Uuid,
    user2_id: Option<Uuid>,
    votes_user1: i64,
    votes_user2: i64,
    entry_fee: i64,
    username1: String,
    username2: Option<String>,
}

#[derive(Debug, FromRow)]
struct DueContest {
    id: Uuid,
    first_prize: i64,
    second_prize: i64,
    third_prize: i64,
}

/// Outcome of a duel by tally
#[derive(Debug, PartialEq, Eq)]
enum DuelOutcome {
    Winner { side: i16, payout: i64 },
    Tie { refund: i64 },
}

/// The winner takes double the entry fee; a tie hands each entrant their
/// fee back.
fn decide_duel(votes_user1: i64, votes_user2: i64, entry_fee: i64) -> DuelOutcome {
    if votes_user1 == votes_user2 {
        DuelOutcome::Tie { refund: entry_fee }
    } else if votes_user1 > votes_user2 {
        DuelOutcome::Winner {
            side: 1,
            payout: entry_fee * 2,
        }
    } else {
        DuelOutcome::Winner {
            side: 2,
            payout: entry_fee * 2,
        }
    }
}

/// Settle every duel whose contest has stopped accepting votes, then rank
/// and close the contests themselves. Each unit of work runs in its own
/// transaction so one failure never blocks the rest of the pass.
pub async fn determine_winners(pool: &PgPool) -> Result<SettlementSummary> {
    let mut summary = SettlementSummary::default();

    let due = sqlx::query_as::<_, DueCompetition>(
        r#"
        SELECT c.id, c.status, c.user1_id, c.user2_id,
               c.votes_user1, c.votes_user2, ct.entry_fee,
               u1.username AS username1, u2.username AS username2
        FROM competitions c
        JOIN contests ct ON ct.id = c.contest_id
        JOIN users u1 ON u1.id = c.user1_id
        LEFT JOIN users u2 ON u2.id = c.user2_id
        WHERE c.status <> 'complete' AND ct.voting_closes_at <= NOW()
        ORDER BY c.created_at
        "#,
    )
    .fetch_all(pool)
    .await?;

    for competition in &due {
        match settle_competition(pool, competition).await {
            Ok(Some(paid)) => {
                summary.competitions_settled += 1;
                summary.tokens_paid += paid;
            }
            // Another settlement pass got there first
            Ok(None) => {}
            Err(e) => error!("Failed to settle competition {}: {}", competition.id, e),
        }
    }

    let contests = sqlx::query_as::<_, DueContest>(
        r#"
        SELECT id, first_prize, second_prize, third_prize
        FROM contests
        WHERE status <> 'complete' AND voting_closes_at <= NOW()
        ORDER BY voting_closes_at
        "#,
    )
    .fetch_all(pool)
    .await?;

    for contest in &contests {
        match rank_contest(pool, contest).await {
            Ok(paid) => {
                summary.contests_ranked += 1;
                summary.tokens_paid += paid;
            }
            Err(e) => error!("Failed to rank contest {}: {}", contest.id, e),
        }
    }

    info!(
        "Settlement pass complete: {} duels settled, {} contests ranked, {} tokens paid",
        summary.competitions_settled, summary.contests_ranked, summary.tokens_paid
    );

    Ok(summary)
}

/// Close one duel. Returns the tokens paid out, or `None` when the guarded
/// status update finds the row already settled.
async fn settle_competition(pool: &PgPool, due: &DueCompetition) -> Result<Option<i64>> {
    let mut tx = pool.begin().await?;

    // A duel still waiting for an opponent closes without any payout
    let unmatched = due.status == CompetitionStatus::Waiting || due.user2_id.is_none();
    if unmatched {
        let closed = sqlx::query(
            r#"
            UPDATE competitions SET status = 'complete', updated_at = NOW()
            WHERE id = $1 AND status <> 'complete'
            "#,
        )
        .bind(due.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if closed == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        notify(&mut tx, due.user1_id, "Your duel closed without an opponent.").await?;

        tx.commit().await?;
        return Ok(Some(0));
    }

    let user2_id = due.user2_id.unwrap_or(due.user1_id);
    let username2 = due.username2.as_deref().unwrap_or(&due.username1);

    let mut paid = 0i64;
    match decide_duel(due.votes_user1, due.votes_user2, due.entry_fee) {
        DuelOutcome::Winner { side, payout } => {
            let (winner_id, winner_name, loser_id) = if side == 1 {
                (due.user1_id, due.username1.as_str(), user2_id)
            } else {
                (user2_id, username2, due.user1_id)
            };

            let settled = sqlx::query(
                r#"
                UPDATE competitions
                SET status = 'complete', winner_user_id = $2, winner_username = $3,
                    winner_earnings = $4, updated_at = NOW()
                WHERE id = $1 AND status = 'active'
                "#,
            )
            .bind(due.id)
            .bind(winner_id)
            .bind(winner_name)
            .bind(payout)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if settled == 0 {
                tx.rollback().await?;
                return Ok(None);
            }

            if payout > 0 {
                credit(
                    &mut tx,
                    winner_id,
                    WalletEntryType::CompetitionPayout,
                    payout,
                    &format!("Won duel {}", due.id),
                )
                .await?;
                paid += payout;
            }

            notify(
                &mut tx,
                winner_id,
                &format!("You won your duel! +{payout} tokens"),
            )
            .await?;
            notify(&mut tx, loser_id, "Your duel has ended. Better luck next time!").await?;
        }
        DuelOutcome::Tie { refund } => {
            let combined = format!("{} & {}", due.username1, username2);

            // A tie records no earnings; the refunds live in the ledger.
            let settled = sqlx::query(
                r#"
                UPDATE competitions
                SET status = 'complete', winner_username = $2, winner_earnings = 0,
                    updated_at = NOW()
                WHERE id = $1 AND status = 'active'
                "#,
            )
            .bind(due.id)
            .bind(&combined)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if settled == 0 {
                tx.rollback().await?;
                return Ok(None);
            }

            if refund > 0 {
                for entrant in [due.user1_id, user2_id] {
                    credit(
                        &mut tx,
                        entrant,
                        WalletEntryType::TieRefund,
                        refund,
                        &format!("Tie refund for duel {}", due.id),
                    )
                    .await?;
                    paid += refund;
                }
            }

            for entrant in [due.user1_id, user2_id] {
                notify(
                    &mut tx,
                    entrant,
                    "Your duel ended in a tie! Your entry fee was refunded.",
                )
                .await?;
            }
        }
    }

    tx.commit().await?;
    Ok(Some(paid))
}

/// Rank a closed contest's duel winners by the votes real users cast for
/// them, record the podium, pay the prizes and mark the contest complete.
async fn rank_contest(pool: &PgPool, contest: &DueContest) -> Result<i64> {
    let mut tx = pool.begin().await?;

    // Seed accounts and anonymous votes never count toward the podium
    let podium = sqlx::query(
        r#"
        WITH tallies AS (
            SELECT c.id AS competition_id, c.winner_user_id,
                   COUNT(v.id) FILTER (WHERE NOT vu.is_seed) AS total_votes
            FROM competitions c
            LEFT JOIN votes v ON v.competition_id = c.id
            LEFT JOIN users vu ON vu.id = v.voter_id
            WHERE c.contest_id = $1 AND c.winner_user_id IS NOT NULL
            GROUP BY c.id, c.winner_user_id
        )
        SELECT competition_id, winner_user_id, total_votes,
               ROW_NUMBER() OVER (ORDER BY total_votes DESC, competition_id) AS place
        FROM tallies
        ORDER BY place
        LIMIT 3
        "#,
    )
    .bind(contest.id)
    .fetch_all(&mut *tx)
    .await?;

    let prizes = [contest.first_prize, contest.second_prize, contest.third_prize];

    let mut paid = 0i64;
    for row in &podium {
        let competition_id: Uuid = row.get("competition_id");
        let user_id: Uuid = row.get("winner_user_id");
        let place: i64 = row.get("place");
        let position = place as i16;
        let amount = prizes[(place - 1) as usize];

        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO winners (contest_id, competition_id, user_id, position, amount)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (contest_id, position) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(contest.id)
        .bind(competition_id)
        .bind(user_id)
        .bind(position)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_some() && amount > 0 {
            credit(
                &mut tx,
                user_id,
                WalletEntryType::ContestPayout,
                amount,
                &format!("Contest prize: place {position}"),
            )
            .await?;
            notify(
                &mut tx,
                user_id,
                &format!("You placed #{position} in the contest! +{amount} tokens"),
            )
            .await?;
            paid += amount;
        }
    }

    sqlx::query("UPDATE contests SET status = 'complete', updated_at = NOW() WHERE id = $1")
        .bind(contest.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(paid)
}

#[cfg(test)]
mod tests {
    use super::*;

    use common::{
        config::AppConfig,
        database::{init_pool, run_migrations},
    };

    use crate::models::ContestStatus;

    #[test]
    fn higher_tally_wins_double_the_fee() {
        assert_eq!(
            decide_duel(10, 3, 5),
            DuelOutcome::Winner { side: 1, payout: 10 }
        );
        assert_eq!(
            decide_duel(3, 10, 5),
            DuelOutcome::Winner { side: 2, payout: 10 }
        );
    }

    #[test]
    fn equal_tallies_refund_the_fee() {
        assert_eq!(decide_duel(7, 7, 5), DuelOutcome::Tie { refund: 5 });
    }

    #[test]
    fn free_contest_duel_pays_nothing() {
        assert_eq!(
            decide_duel(2, 1, 0),
            DuelOutcome::Winner { side: 1, payout: 0 }
        );
        assert_eq!(decide_duel(0, 0, 0), DuelOutcome::Tie { refund: 0 });
    }

    async fn test_pool() -> Result<PgPool> {
        let config = AppConfig::load()?;
        let pool = init_pool(&config.database).await?;
        run_migrations(&pool).await?;
        Ok(pool)
    }

    async fn insert_user(pool: &PgPool, suffix: &str, tag: &str, is_seed: bool) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, email, password_hash, referral_code, is_seed)
            VALUES ($1, $2, 'x', $3, $4)
            RETURNING id
            "#,
        )
        .bind(format!("{tag}_{suffix}"))
        .bind(format!("{tag}_{suffix}@example.com"))
        .bind(format!("{tag}{suffix}"))
        .bind(is_seed)
        .fetch_one(pool)
        .await?;

        sqlx::query("INSERT INTO wallets (user_id, balance) VALUES ($1, 100)")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(id)
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn settles_closed_duels_and_ranks_the_contest() -> Result<()> {
        let pool = test_pool().await?;
        let suffix = Uuid::new_v4().simple().to_string();

        let user1 = insert_user(&pool, &suffix, "duelist1", false).await?;
        let user2 = insert_user(&pool, &suffix, "duelist2", false).await?;
        let fan = insert_user(&pool, &suffix, "fan", false).await?;
        let shill = insert_user(&pool, &suffix, "shill", true).await?;

        let theme_id: Uuid = sqlx::query_scalar("INSERT INTO themes (name) VALUES ($1) RETURNING id")
            .bind(format!("Theme {suffix}"))
            .fetch_one(&pool)
            .await?;

        let contest_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO contests (theme_id, status, entry_fee,
                                  first_prize, second_prize, third_prize,
                                  submission_opens_at, submission_closes_at,
                                  voting_opens_at, voting_closes_at)
            VALUES ($1, 'live', 5, 20, 10, 5,
                    NOW() - INTERVAL '7 days', NOW() - INTERVAL '5 days',
                    NOW() - INTERVAL '5 days', NOW() - INTERVAL '1 hour')
            RETURNING id
            "#,
        )
        .bind(theme_id)
        .fetch_one(&pool)
        .await?;

        let competition_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO competitions (contest_id, status, user1_id, user2_id,
                                      image1_url, image2_url,
                                      votes_user1, votes_user2, matched_at)
            VALUES ($1, 'active', $2, $3, '/uploads/a.jpg', '/uploads/b.jpg',
                    3, 1, NOW() - INTERVAL '2 days')
            RETURNING id
            "#,
        )
        .bind(contest_id)
        .bind(user1)
        .bind(user2)
        .fetch_one(&pool)
        .await?;

        // A duel that never found an opponent closes without a payout
        let lonely = insert_user(&pool, &suffix, "lonely", false).await?;
        let waiting_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO competitions (contest_id, status, user1_id, image1_url)
            VALUES ($1, 'waiting', $2, '/uploads/c.jpg')
            RETURNING id
            "#,
        )
        .bind(contest_id)
        .bind(lonely)
        .fetch_one(&pool)
        .await?;

        // One real vote, one seed vote, one anonymous vote; only the first
        // counts toward the podium tally.
        for voter in [Some(fan), Some(shill), None] {
            sqlx::query("INSERT INTO votes (competition_id, voter_id, side) VALUES ($1, $2, 1)")
                .bind(competition_id)
                .bind(voter)
                .execute(&pool)
                .await?;
        }

        determine_winners(&pool).await?;

        let duel = sqlx::query(
            r#"
            SELECT status, winner_user_id, winner_username, winner_earnings
            FROM competitions WHERE id = $1
            "#,
        )
        .bind(competition_id)
        .fetch_one(&pool)
        .await?;
        assert_eq!(
            duel.get::<CompetitionStatus, _>("status"),
            CompetitionStatus::Complete
        );
        assert_eq!(duel.get::<Option<Uuid>, _>("winner_user_id"), Some(user1));
        assert_eq!(
            duel.get::<String, _>("winner_username"),
            format!("duelist1_{suffix}")
        );
        assert_eq!(duel.get::<i64, _>("winner_earnings"), 10);

        let contest_status: ContestStatus =
            sqlx::query_scalar("SELECT status FROM contests WHERE id = $1")
                .bind(contest_id)
                .fetch_one(&pool)
                .await?;
        assert_eq!(contest_status, ContestStatus::Complete);

        let podium = sqlx::query("SELECT user_id, position, amount FROM winners WHERE contest_id = $1")
            .bind(contest_id)
            .fetch_all(&pool)
            .await?;
        assert_eq!(podium.len(), 1);
        assert_eq!(podium[0].get::<Uuid, _>("user_id"), user1);
        assert_eq!(podium[0].get::<i16, _>("position"), 1);
        assert_eq!(podium[0].get::<i64, _>("amount"), 20);

        // 100 starting balance + 10 duel payout + 20 first prize
        let balance: i64 = sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1")
            .bind(user1)
            .fetch_one(&pool)
            .await?;
        assert_eq!(balance, 130);

        // Settling again must not pay anyone twice
        determine_winners(&pool).await?;
        let balance_after: i64 = sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1")
            .bind(user1)
            .fetch_one(&pool)
            .await?;
        assert_eq!(balance_after, 130);

        let loser_balance: i64 = sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1")
            .bind(user2)
            .fetch_one(&pool)
            .await?;
        assert_eq!(loser_balance, 100);

        let waiting = sqlx::query(
            "SELECT status, winner_user_id, winner_earnings FROM competitions WHERE id = $1",
        )
        .bind(waiting_id)
        .fetch_one(&pool)
        .await?;
        assert_eq!(
            waiting.get::<CompetitionStatus, _>("status"),
            CompetitionStatus::Complete
        );
        assert_eq!(waiting.get::<Option<Uuid>, _>("winner_user_id"), None);
        assert_eq!(waiting.get::<i64, _>("winner_earnings"), 0);

        let lonely_balance: i64 =
            sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1")
                .bind(lonely)
                .fetch_one(&pool)
                .await?;
        assert_eq!(lonely_balance, 100);

        let lonely_alerts: Vec<String> =
            sqlx::query_scalar("SELECT message FROM alerts WHERE user_id = $1")
                .bind(lonely)
                .fetch_all(&pool)
                .await?;
        assert_eq!(lonely_alerts, vec!["Your duel closed without an opponent."]);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn settles_a_tied_duel_with_refunds() -> Result<()> {
        let pool = test_pool().await?;
        let suffix = Uuid::new_v4().simple().to_string();

        let user1 = insert_user(&pool, &suffix, "even1", false).await?;
        let user2 = insert_user(&pool, &suffix, "even2", false).await?;

        let theme_id: Uuid = sqlx::query_scalar("INSERT INTO themes (name) VALUES ($1) RETURNING id")
            .bind(format!("Tie theme {suffix}"))
            .fetch_one(&pool)
            .await?;

        let contest_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO contests (theme_id, status, entry_fee,
                                  first_prize, second_prize, third_prize,
                                  submission_opens_at, submission_closes_at,
                                  voting_opens_at, voting_closes_at)
            VALUES ($1, 'live', 5, 20, 10, 5,
                    NOW() - INTERVAL '7 days', NOW() - INTERVAL '5 days',
                    NOW() - INTERVAL '5 days', NOW() - INTERVAL '1 hour')
            RETURNING id
            "#,
        )
        .bind(theme_id)
        .fetch_one(&pool)
        .await?;

        let competition_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO competitions (contest_id, status, user1_id, user2_id,
                                      image1_url, image2_url,
                                      votes_user1, votes_user2, matched_at)
            VALUES ($1, 'active', $2, $3, '/uploads/a.jpg', '/uploads/b.jpg',
                    7, 7, NOW() - INTERVAL '2 days')
            RETURNING id
            "#,
        )
        .bind(contest_id)
        .bind(user1)
        .bind(user2)
        .fetch_one(&pool)
        .await?;

        determine_winners(&pool).await?;

        let duel = sqlx::query(
            r#"
            SELECT status, winner_user_id, winner_username, winner_earnings
            FROM competitions WHERE id = $1
            "#,
        )
        .bind(competition_id)
        .fetch_one(&pool)
        .await?;
        assert_eq!(
            duel.get::<CompetitionStatus, _>("status"),
            CompetitionStatus::Complete
        );
        assert_eq!(duel.get::<Option<Uuid>, _>("winner_user_id"), None);
        assert_eq!(
            duel.get::<String, _>("winner_username"),
            format!("even1_{suffix} & even2_{suffix}")
        );
        assert_eq!(duel.get::<i64, _>("winner_earnings"), 0);

        // Each entrant gets the 5-token fee back, in the ledger exactly once
        for entrant in [user1, user2] {
            let balance: i64 =
                sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1")
                    .bind(entrant)
                    .fetch_one(&pool)
                    .await?;
            assert_eq!(balance, 105);

            let refunds =
                sqlx::query("SELECT entry_type, amount FROM wallet_entries WHERE user_id = $1")
                    .bind(entrant)
                    .fetch_all(&pool)
                    .await?;
            assert_eq!(refunds.len(), 1);
            assert_eq!(
                refunds[0].get::<WalletEntryType, _>("entry_type"),
                WalletEntryType::TieRefund
            );
            assert_eq!(refunds[0].get::<i64, _>("amount"), 5);
        }

        // A tie leaves no duel winner, so the podium stays empty
        let podium_len: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM winners WHERE contest_id = $1")
                .bind(contest_id)
                .fetch_one(&pool)
                .await?;
        assert_eq!(podium_len, 0);

        // Settling again must not refund twice
        determine_winners(&pool).await?;
        let balance_after: i64 =
            sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1")
                .bind(user1)
                .fetch_one(&pool)
                .await?;
        assert_eq!(balance_after, 105);

        Ok(())
    }
}

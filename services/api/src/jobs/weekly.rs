//! Weekly engagement snapshots and leaderboard rewards

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use common::week::{current_week_window, previous_week_window};

use crate::models::WalletEntryType;

use super::{credit, notify};

/// Token rewards for ranks one through three on each weekly leaderboard
pub const WEEKLY_REWARDS: [i64; 3] = [14, 8, 4];

fn reward_for_rank(rank: i16) -> i64 {
    WEEKLY_REWARDS
        .get(rank as usize - 1)
        .copied()
        .unwrap_or(0)
}

/// Snapshot voter, competitor and report engagement for the week that just
/// ended. Each snapshot splits users into new (first activity fell inside
/// the week) and repeat. Re-running the job overwrites the same week.
pub async fn compute_weekly_stats(pool: &PgPool, now: DateTime<Utc>) -> Result<()> {
    let (from, to) = previous_week_window(now);
    let week_start = from.date_naive();

    let voters = sqlx::query(
        r#"
        WITH firsts AS (
            SELECT voter_id, MIN(created_at) AS first_vote
            FROM votes
            WHERE voter_id IS NOT NULL
            GROUP BY voter_id
        ), active AS (
            SELECT DISTINCT voter_id
            FROM votes
            WHERE voter_id IS NOT NULL AND created_at >= $1 AND created_at < $2
        )
        SELECT COUNT(*) FILTER (WHERE f.first_vote >= $1) AS new_count,
               COUNT(*) FILTER (WHERE f.first_vote < $1) AS repeat_count
        FROM active a
        JOIN firsts f ON f.voter_id = a.voter_id
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO weekly_voter_stats (week_start, new_voters, repeat_voters, computed_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (week_start) DO UPDATE
        SET new_voters = EXCLUDED.new_voters,
            repeat_voters = EXCLUDED.repeat_voters,
            computed_at = NOW()
        "#,
    )
    .bind(week_start)
    .bind(voters.get::<i64, _>("new_count"))
    .bind(voters.get::<i64, _>("repeat_count"))
    .execute(pool)
    .await?;

    // A user competes when they open a duel or get matched into one
    let competitors = sqlx::query(
        r#"
        WITH participation AS (
            SELECT user1_id AS user_id, created_at AS entered_at FROM competitions
            UNION ALL
            SELECT user2_id, COALESCE(matched_at, created_at) FROM competitions
            WHERE user2_id IS NOT NULL
        ), firsts AS (
            SELECT user_id, MIN(entered_at) AS first_entry
            FROM participation
            GROUP BY user_id
        ), active AS (
            SELECT DISTINCT user_id
            FROM participation
            WHERE entered_at >= $1 AND entered_at < $2
        )
        SELECT COUNT(*) FILTER (WHERE f.first_entry >= $1) AS new_count,
               COUNT(*) FILTER (WHERE f.first_entry < $1) AS repeat_count
        FROM active a
        JOIN firsts f ON f.user_id = a.user_id
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO weekly_competitor_stats (week_start, new_competitors, repeat_competitors, computed_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (week_start) DO UPDATE
        SET new_competitors = EXCLUDED.new_competitors,
            repeat_competitors = EXCLUDED.repeat_competitors,
            computed_at = NOW()
        "#,
    )
    .bind(week_start)
    .bind(competitors.get::<i64, _>("new_count"))
    .bind(competitors.get::<i64, _>("repeat_count"))
    .execute(pool)
    .await?;

    let reports = sqlx::query(
        r#"
        WITH firsts AS (
            SELECT reporter_id, MIN(created_at) AS first_report
            FROM reports
            WHERE reporter_id IS NOT NULL
            GROUP BY reporter_id
        ), active AS (
            SELECT DISTINCT reporter_id
            FROM reports
            WHERE reporter_id IS NOT NULL AND created_at >= $1 AND created_at < $2
        )
        SELECT (SELECT COUNT(*) FROM reports
                WHERE created_at >= $1 AND created_at < $2) AS reports_filed,
               COUNT(*) FILTER (WHERE f.first_report >= $1) AS new_count,
               COUNT(*) FILTER (WHERE f.first_report < $1) AS repeat_count
        FROM active a
        JOIN firsts f ON f.reporter_id = a.reporter_id
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO weekly_report_stats (week_start, reports_filed, new_reporters, repeat_reporters, computed_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (week_start) DO UPDATE
        SET reports_filed = EXCLUDED.reports_filed,
            new_reporters = EXCLUDED.new_reporters,
            repeat_reporters = EXCLUDED.repeat_reporters,
            computed_at = NOW()
        "#,
    )
    .bind(week_start)
    .bind(reports.get::<i64, _>("reports_filed"))
    .bind(reports.get::<i64, _>("new_count"))
    .bind(reports.get::<i64, _>("repeat_count"))
    .execute(pool)
    .await?;

    info!("Weekly statistics computed for week of {}", week_start);
    Ok(())
}

/// Record the podium for the running week's voter and referrer leaderboards
/// and pay the rewards. The unique (week_start, rank) constraint keeps a
/// re-run from paying anyone twice.
pub async fn award_weekly_rewards(pool: &PgPool, now: DateTime<Utc>) -> Result<()> {
    let (from, to) = current_week_window(now);
    let week_start = from.date_naive();

    let top_voters = sqlx::query(
        r#"
        SELECT v.voter_id AS user_id, u.username, COUNT(*) AS count
        FROM votes v
        JOIN users u ON u.id = v.voter_id
        WHERE v.created_at >= $1 AND v.created_at < $2
        GROUP BY v.voter_id, u.username
        ORDER BY count DESC, u.username
        LIMIT 3
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    let mut voters_rewarded = 0u64;
    let mut tx = pool.begin().await?;
    for (index, row) in top_voters.iter().enumerate() {
        let rank = index as i16 + 1;
        let reward = reward_for_rank(rank);
        let user_id: Uuid = row.get("user_id");
        let count: i64 = row.get("count");

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO weekly_top_voters (week_start, user_id, rank, votes_cast, reward)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (week_start, rank) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(week_start)
        .bind(user_id)
        .bind(rank)
        .bind(count)
        .bind(reward)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_some() && reward > 0 {
            credit(
                &mut tx,
                user_id,
                WalletEntryType::WeeklyReward,
                reward,
                &format!("Weekly top voter reward (rank {rank})"),
            )
            .await?;
            notify(
                &mut tx,
                user_id,
                &format!("You finished #{rank} on this week's voter leaderboard! +{reward} tokens"),
            )
            .await?;
            voters_rewarded += 1;
        }
    }
    tx.commit().await?;

    let top_referrers = sqlx::query(
        r#"
        SELECT u.referred_by AS user_id, r.username, COUNT(*) AS count
        FROM users u
        JOIN users r ON r.id = u.referred_by
        WHERE u.created_at >= $1 AND u.created_at < $2
        GROUP BY u.referred_by, r.username
        ORDER BY count DESC, r.username
        LIMIT 3
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    let mut referrers_rewarded = 0u64;
    let mut tx = pool.begin().await?;
    for (index, row) in top_referrers.iter().enumerate() {
        let rank = index as i16 + 1;
        let reward = reward_for_rank(rank);
        let user_id: Uuid = row.get("user_id");
        let count: i64 = row.get("count");

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO weekly_top_referrers (week_start, user_id, rank, referrals, reward)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (week_start, rank) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(week_start)
        .bind(user_id)
        .bind(rank)
        .bind(count)
        .bind(reward)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_some() && reward > 0 {
            credit(
                &mut tx,
                user_id,
                WalletEntryType::WeeklyReward,
                reward,
                &format!("Weekly top referrer reward (rank {rank})"),
            )
            .await?;
            notify(
                &mut tx,
                user_id,
                &format!(
                    "You finished #{rank} on this week's referral leaderboard! +{reward} tokens"
                ),
            )
            .await?;
            referrers_rewarded += 1;
        }
    }
    tx.commit().await?;

    info!(
        "Weekly rewards paid for week of {}: {} voters, {} referrers",
        week_start, voters_rewarded, referrers_rewarded
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone};

    use common::{
        config::AppConfig,
        database::{init_pool, run_migrations},
    };

    #[test]
    fn rewards_step_down_the_podium() {
        assert_eq!(reward_for_rank(1), 14);
        assert_eq!(reward_for_rank(2), 8);
        assert_eq!(reward_for_rank(3), 4);
    }

    #[test]
    fn ranks_off_the_podium_pay_nothing() {
        assert_eq!(reward_for_rank(4), 0);
    }

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

    async fn insert_vote(
        pool: &PgPool,
        competition_id: Uuid,
        voter_id: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO votes (competition_id, voter_id, side, created_at) VALUES ($1, $2, 1, $3)",
        )
        .bind(competition_id)
        .bind(voter_id)
        .bind(at)
        .execute(pool)
        .await?;

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn splits_weekly_voters_into_new_and_repeat() -> Result<()> {
        let pool = test_pool().await?;
        let suffix = Uuid::new_v4().simple().to_string();

        // Snapshots are keyed by calendar week, so aim this one at a
        // far-future week no other run will touch.
        let weeks_ahead = i64::from(rand::random::<u16>()) + 100;
        let now =
            Utc.with_ymd_and_hms(2030, 1, 3, 12, 0, 0).unwrap() + Duration::weeks(weeks_ahead);
        let (from, _to) = previous_week_window(now);

        let host1 = insert_user(&pool, &suffix, "host1").await?;
        let host2 = insert_user(&pool, &suffix, "host2").await?;

        let theme_id: Uuid = sqlx::query_scalar("INSERT INTO themes (name) VALUES ($1) RETURNING id")
            .bind(format!("Weekly theme {suffix}"))
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
                    NOW() - INTERVAL '2 days', NOW() + INTERVAL '30 days')
            RETURNING id
            "#,
        )
        .bind(theme_id)
        .fetch_one(&pool)
        .await?;

        // Two duels, because a voter can only vote once per duel and the
        // veterans need both an earlier vote and one inside the week
        let mut duels = Vec::new();
        for _ in 0..2 {
            let id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO competitions (contest_id, status, user1_id, user2_id,
                                          image1_url, image2_url, matched_at)
                VALUES ($1, 'active', $2, $3, '/uploads/a.jpg', '/uploads/b.jpg', NOW())
                RETURNING id
                "#,
            )
            .bind(contest_id)
            .bind(host1)
            .bind(host2)
            .fetch_one(&pool)
            .await?;
            duels.push(id);
        }

        for tag in ["rep1", "rep2"] {
            let veteran = insert_user(&pool, &suffix, tag).await?;
            insert_vote(&pool, duels[0], Some(veteran), from - Duration::days(3)).await?;
            insert_vote(&pool, duels[1], Some(veteran), from + Duration::days(1)).await?;
        }

        for tag in ["new1", "new2", "new3"] {
            let first_timer = insert_user(&pool, &suffix, tag).await?;
            insert_vote(&pool, duels[0], Some(first_timer), from + Duration::days(2)).await?;
        }

        // Anonymous activity inside the week lands in neither bucket
        insert_vote(&pool, duels[0], None, from + Duration::days(2)).await?;

        compute_weekly_stats(&pool, now).await?;

        let voters = sqlx::query(
            "SELECT new_voters, repeat_voters FROM weekly_voter_stats WHERE week_start = $1",
        )
        .bind(from.date_naive())
        .fetch_one(&pool)
        .await?;
        assert_eq!(voters.get::<i64, _>("new_voters"), 3);
        assert_eq!(voters.get::<i64, _>("repeat_voters"), 2);

        // The sibling snapshots cover the same week even with nothing in it
        let competitors = sqlx::query(
            "SELECT new_competitors, repeat_competitors FROM weekly_competitor_stats WHERE week_start = $1",
        )
        .bind(from.date_naive())
        .fetch_one(&pool)
        .await?;
        assert_eq!(competitors.get::<i64, _>("new_competitors"), 0);
        assert_eq!(competitors.get::<i64, _>("repeat_competitors"), 0);

        // Recomputing overwrites the week instead of stacking a second row
        compute_weekly_stats(&pool, now).await?;

        let snapshots: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM weekly_voter_stats WHERE week_start = $1")
                .bind(from.date_naive())
                .fetch_one(&pool)
                .await?;
        assert_eq!(snapshots, 1);

        let voters = sqlx::query(
            "SELECT new_voters, repeat_voters FROM weekly_voter_stats WHERE week_start = $1",
        )
        .bind(from.date_naive())
        .fetch_one(&pool)
        .await?;
        assert_eq!(voters.get::<i64, _>("new_voters"), 3);
        assert_eq!(voters.get::<i64, _>("repeat_voters"), 2);

        Ok(())
    }
}

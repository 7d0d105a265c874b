//! Statistics repository: dashboard counters, leaderboards and the
//! weekly snapshots written by the scheduled jobs

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::models::{
    LeaderboardRow, MetricsOverview, WeeklyCompetitorStats, WeeklyRankRow, WeeklyReportStats,
    WeeklyVoterStats,
};

/// Statistics repository
#[derive(Clone)]
pub struct StatsRepository {
    pool: PgPool,
}

impl StatsRepository {
    /// Create a new statistics repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Counters for the admin dashboard; the vote window is the running week
    pub async fn overview(
        &self,
        week_from: DateTime<Utc>,
        week_to: DateTime<Utc>,
    ) -> Result<MetricsOverview> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users_total,
                (SELECT COUNT(*) FROM contests WHERE status = 'upcoming') AS contests_upcoming,
                (SELECT COUNT(*) FROM contests WHERE status = 'live') AS contests_live,
                (SELECT COUNT(*) FROM contests WHERE status = 'complete') AS contests_complete,
                (SELECT COUNT(*) FROM competitions WHERE status = 'waiting') AS competitions_waiting,
                (SELECT COUNT(*) FROM competitions WHERE status = 'active') AS competitions_active,
                (SELECT COUNT(*) FROM competitions WHERE status = 'complete') AS competitions_complete,
                (SELECT COUNT(*) FROM votes) AS votes_total,
                (SELECT COUNT(*) FROM votes WHERE created_at >= $1 AND created_at < $2) AS votes_this_week,
                (SELECT COUNT(*) FROM reports WHERE status = 'open') AS reports_open
            "#,
        )
        .bind(week_from)
        .bind(week_to)
        .fetch_one(&self.pool)
        .await?;

        Ok(MetricsOverview {
            users_total: row.get("users_total"),
            contests_upcoming: row.get("contests_upcoming"),
            contests_live: row.get("contests_live"),
            contests_complete: row.get("contests_complete"),
            competitions_waiting: row.get("competitions_waiting"),
            competitions_active: row.get("competitions_active"),
            competitions_complete: row.get("competitions_complete"),
            votes_total: row.get("votes_total"),
            votes_this_week: row.get("votes_this_week"),
            reports_open: row.get("reports_open"),
        })
    }

    /// Top voters inside a time window, most votes first
    pub async fn top_voters(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LeaderboardRow>> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT v.voter_id AS user_id, u.username, COUNT(*) AS count
            FROM votes v
            JOIN users u ON u.id = v.voter_id
            WHERE v.created_at >= $1 AND v.created_at < $2
            GROUP BY v.voter_id, u.username
            ORDER BY count DESC, u.username
            LIMIT $3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Top referrers inside a time window, most signups brought in first
    pub async fn top_referrers(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LeaderboardRow>> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT u.referred_by AS user_id, r.username, COUNT(*) AS count
            FROM users u
            JOIN users r ON r.id = u.referred_by
            WHERE u.created_at >= $1 AND u.created_at < $2
            GROUP BY u.referred_by, r.username
            ORDER BY count DESC, r.username
            LIMIT $3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Past weekly voter podiums, latest week first
    pub async fn top_voter_history(&self, limit: i64) -> Result<Vec<WeeklyRankRow>> {
        let rows = sqlx::query_as::<_, WeeklyRankRow>(
            r#"
            SELECT wt.week_start, wt.user_id, u.username, wt.rank, wt.votes_cast AS count, wt.reward
            FROM weekly_top_voters wt
            JOIN users u ON u.id = wt.user_id
            ORDER BY wt.week_start DESC, wt.rank
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Past weekly referrer podiums, latest week first
    pub async fn top_referrer_history(&self, limit: i64) -> Result<Vec<WeeklyRankRow>> {
        let rows = sqlx::query_as::<_, WeeklyRankRow>(
            r#"
            SELECT wt.week_start, wt.user_id, u.username, wt.rank, wt.referrals AS count, wt.reward
            FROM weekly_top_referrers wt
            JOIN users u ON u.id = wt.user_id
            ORDER BY wt.week_start DESC, wt.rank
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Recent weekly voter engagement snapshots
    pub async fn voter_stats(&self, limit: i64) -> Result<Vec<WeeklyVoterStats>> {
        let rows = sqlx::query_as::<_, WeeklyVoterStats>(
            "SELECT * FROM weekly_voter_stats ORDER BY week_start DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Recent weekly competitor engagement snapshots
    pub async fn competitor_stats(&self, limit: i64) -> Result<Vec<WeeklyCompetitorStats>> {
        let rows = sqlx::query_as::<_, WeeklyCompetitorStats>(
            "SELECT * FROM weekly_competitor_stats ORDER BY week_start DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Recent weekly moderation snapshots
    pub async fn report_stats(&self, limit: i64) -> Result<Vec<WeeklyReportStats>> {
        let rows = sqlx::query_as::<_, WeeklyReportStats>(
            "SELECT * FROM weekly_report_stats ORDER BY week_start DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

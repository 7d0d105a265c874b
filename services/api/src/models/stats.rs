//! Aggregated statistics and leaderboard rows

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Weekly voter engagement snapshot
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WeeklyVoterStats {
    pub week_start: NaiveDate,
    pub new_voters: i64,
    pub repeat_voters: i64,
    pub computed_at: DateTime<Utc>,
}

/// Weekly competitor engagement snapshot
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WeeklyCompetitorStats {
    pub week_start: NaiveDate,
    pub new_competitors: i64,
    pub repeat_competitors: i64,
    pub computed_at: DateTime<Utc>,
}

/// Weekly moderation volume snapshot
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WeeklyReportStats {
    pub week_start: NaiveDate,
    pub reports_filed: i64,
    pub new_reporters: i64,
    pub repeat_reporters: i64,
    pub computed_at: DateTime<Utc>,
}

/// Live leaderboard row for the current week
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub username: String,
    pub count: i64,
}

/// Historic weekly podium row (top voters or top referrers)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WeeklyRankRow {
    pub week_start: NaiveDate,
    pub user_id: Uuid,
    pub username: String,
    pub rank: i16,
    pub count: i64,
    pub reward: i64,
}

/// Admin dashboard counters
#[derive(Debug, Clone, Serialize, Default)]
pub struct MetricsOverview {
    pub users_total: i64,
    pub contests_upcoming: i64,
    pub contests_live: i64,
    pub contests_complete: i64,
    pub competitions_waiting: i64,
    pub competitions_active: i64,
    pub competitions_complete: i64,
    pub votes_total: i64,
    pub votes_this_week: i64,
    pub reports_open: i64,
}

//! Contest model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Contest lifecycle, stored as the `contest_status` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "contest_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContestStatus {
    Upcoming,
    Live,
    Complete,
}

/// Contest entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Contest {
    pub id: Uuid,
    pub theme_id: Uuid,
    pub status: ContestStatus,
    pub entry_fee: i64,
    pub prize_pool: i64,
    pub first_prize: i64,
    pub second_prize: i64,
    pub third_prize: i64,
    pub submission_opens_at: DateTime<Utc>,
    pub submission_closes_at: DateTime<Utc>,
    pub voting_opens_at: DateTime<Utc>,
    pub voting_closes_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contest {
    /// Whether new entries are currently accepted
    pub fn accepts_entries(&self, now: DateTime<Utc>) -> bool {
        self.status == ContestStatus::Live
            && now >= self.submission_opens_at
            && now < self.submission_closes_at
    }

    /// Whether votes are currently accepted
    pub fn accepts_votes(&self, now: DateTime<Utc>) -> bool {
        self.status == ContestStatus::Live
            && now >= self.voting_opens_at
            && now < self.voting_closes_at
    }
}

/// New contest creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewContest {
    pub theme_id: Uuid,
    pub entry_fee: i64,
    #[serde(default)]
    pub prize_pool: i64,
    #[serde(default)]
    pub first_prize: i64,
    #[serde(default)]
    pub second_prize: i64,
    #[serde(default)]
    pub third_prize: i64,
    pub submission_opens_at: DateTime<Utc>,
    pub submission_closes_at: DateTime<Utc>,
    pub voting_opens_at: DateTime<Utc>,
    pub voting_closes_at: DateTime<Utc>,
}

/// Contest update payload
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateContest {
    pub theme_id: Option<Uuid>,
    pub status: Option<ContestStatus>,
    pub entry_fee: Option<i64>,
    pub prize_pool: Option<i64>,
    pub first_prize: Option<i64>,
    pub second_prize: Option<i64>,
    pub third_prize: Option<i64>,
    pub submission_opens_at: Option<DateTime<Utc>>,
    pub submission_closes_at: Option<DateTime<Utc>>,
    pub voting_opens_at: Option<DateTime<Utc>>,
    pub voting_closes_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn contest_at(status: ContestStatus) -> Contest {
        let base = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        Contest {
            id: Uuid::new_v4(),
            theme_id: Uuid::new_v4(),
            status,
            entry_fee: 5,
            prize_pool: 0,
            first_prize: 50,
            second_prize: 25,
            third_prize: 10,
            submission_opens_at: base,
            submission_closes_at: base + chrono::Duration::days(3),
            voting_opens_at: base,
            voting_closes_at: base + chrono::Duration::days(7),
            created_at: base,
            updated_at: base,
        }
    }

    #[test]
    fn entries_only_accepted_while_live_and_open() {
        let contest = contest_at(ContestStatus::Live);
        let during = contest.submission_opens_at + chrono::Duration::days(1);
        let after = contest.submission_closes_at;

        assert!(contest.accepts_entries(during));
        assert!(!contest.accepts_entries(after));
        assert!(!contest_at(ContestStatus::Upcoming).accepts_entries(during));
        assert!(!contest_at(ContestStatus::Complete).accepts_entries(during));
    }

    #[test]
    fn voting_window_is_half_open() {
        let contest = contest_at(ContestStatus::Live);

        assert!(contest.accepts_votes(contest.voting_opens_at));
        assert!(!contest.accepts_votes(contest.voting_closes_at));
    }
}

//! Competition (head-to-head duel) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Duel lifecycle, stored as the `competition_status` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "competition_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompetitionStatus {
    Waiting,
    Active,
    Complete,
}

/// Competition entity: two images from two users inside one contest
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Competition {
    pub id: Uuid,
    pub contest_id: Uuid,
    pub status: CompetitionStatus,
    pub user1_id: Uuid,
    pub user2_id: Option<Uuid>,
    pub image1_url: String,
    pub image2_url: Option<String>,
    pub votes_user1: i64,
    pub votes_user2: i64,
    pub invite_code: Option<String>,
    pub image1_flagged: bool,
    pub image2_flagged: bool,
    pub matched_at: Option<DateTime<Utc>>,
    pub winner_user_id: Option<Uuid>,
    pub winner_username: Option<String>,
    pub winner_earnings: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Competition {
    /// Side (1 or 2) an image URL belongs to, if it belongs at all
    pub fn side_of(&self, image_url: &str) -> Option<i16> {
        if self.image1_url == image_url {
            Some(1)
        } else if self.image2_url.as_deref() == Some(image_url) {
            Some(2)
        } else {
            None
        }
    }
}

/// A duel as served to voters; participant identities stay hidden
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VotingEntry {
    pub id: Uuid,
    pub contest_id: Uuid,
    pub theme_name: String,
    pub image1_url: String,
    pub image2_url: String,
    pub voting_closes_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duel() -> Competition {
        Competition {
            id: Uuid::new_v4(),
            contest_id: Uuid::new_v4(),
            status: CompetitionStatus::Active,
            user1_id: Uuid::new_v4(),
            user2_id: Some(Uuid::new_v4()),
            image1_url: "/uploads/a.jpg".into(),
            image2_url: Some("/uploads/b.jpg".into()),
            votes_user1: 0,
            votes_user2: 0,
            invite_code: None,
            image1_flagged: false,
            image2_flagged: false,
            matched_at: Some(Utc::now()),
            winner_user_id: None,
            winner_username: None,
            winner_earnings: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn side_of_maps_images_to_sides() {
        let competition = duel();

        assert_eq!(competition.side_of("/uploads/a.jpg"), Some(1));
        assert_eq!(competition.side_of("/uploads/b.jpg"), Some(2));
        assert_eq!(competition.side_of("/uploads/c.jpg"), None);
    }

    #[test]
    fn side_of_ignores_missing_second_image() {
        let mut competition = duel();
        competition.image2_url = None;

        assert_eq!(competition.side_of("/uploads/b.jpg"), None);
    }
}

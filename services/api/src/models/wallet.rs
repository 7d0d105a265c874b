//! Wallet model and ledger entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Token wallet entity, one per user
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Wallet {
    pub user_id: Uuid,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ledger entry category, stored as the `wallet_entry_type` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "wallet_entry_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WalletEntryType {
    RegistrationBonus,
    ReferralBonus,
    EntryFee,
    CompetitionPayout,
    TieRefund,
    ContestPayout,
    WeeklyReward,
}

/// Append-only wallet ledger entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WalletEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub entry_type: WalletEntryType,
    pub amount: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

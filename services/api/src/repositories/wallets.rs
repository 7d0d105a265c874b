//! Wallet repository for balances and the ledger

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Wallet, WalletEntry, WalletEntryType};

/// Wallet repository
#[derive(Clone)]
pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    /// Create a new wallet repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a user's wallet
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        let wallet = sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(wallet)
    }

    /// Recent ledger entries for a user, newest first
    pub async fn entries(&self, user_id: Uuid, limit: i64) -> Result<Vec<WalletEntry>> {
        let entries = sqlx::query_as::<_, WalletEntry>(
            r#"
            SELECT * FROM wallet_entries
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Sum of all ledger entries of one category for a user
    pub async fn sum_of_type(&self, user_id: Uuid, entry_type: WalletEntryType) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(amount), 0)::BIGINT
            FROM wallet_entries
            WHERE user_id = $1 AND entry_type = $2
            "#,
        )
        .bind(user_id)
        .bind(entry_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

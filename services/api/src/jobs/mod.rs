//! Scheduled background jobs: settlement plus the weekly statistics and
//! rewards passes

pub mod settlement;
pub mod weekly;

use anyhow::Result;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use uuid::Uuid;

use common::config::JobsConfig;

use crate::models::WalletEntryType;

/// Register the three recurring jobs and start the scheduler
pub async fn start_scheduler(config: &JobsConfig, pool: PgPool) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let settlement_pool = pool.clone();
    let job = Job::new_async(config.settlement_schedule.as_str(), move |_, _| {
        let pool = settlement_pool.clone();
        Box::pin(async move {
            info!("Winner determination job executed");
            if let Err(e) = settlement::determine_winners(&pool).await {
                error!("Winner determination failed: {}", e);
            }
        })
    })?;
    scheduler.add(job).await?;

    let stats_pool = pool.clone();
    let job = Job::new_async(config.weekly_stats_schedule.as_str(), move |_, _| {
        let pool = stats_pool.clone();
        Box::pin(async move {
            info!("Weekly statistics job executed");
            if let Err(e) = weekly::compute_weekly_stats(&pool, Utc::now()).await {
                error!("Weekly statistics failed: {}", e);
            }
        })
    })?;
    scheduler.add(job).await?;

    let rewards_pool = pool;
    let job = Job::new_async(config.weekly_rewards_schedule.as_str(), move |_, _| {
        let pool = rewards_pool.clone();
        Box::pin(async move {
            info!("Weekly rewards job executed");
            if let Err(e) = weekly::award_weekly_rewards(&pool, Utc::now()).await {
                error!("Weekly rewards failed: {}", e);
            }
        })
    })?;
    scheduler.add(job).await?;

    scheduler.start().await?;
    info!(
        "Started job scheduler (settlement: {}, stats: {}, rewards: {})",
        config.settlement_schedule, config.weekly_stats_schedule, config.weekly_rewards_schedule
    );

    Ok(scheduler)
}

/// Credit tokens and write the matching ledger entry
pub(crate) async fn credit(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    entry_type: WalletEntryType,
    amount: i64,
    description: &str,
) -> Result<()> {
    sqlx::query("UPDATE wallets SET balance = balance + $2, updated_at = NOW() WHERE user_id = $1")
        .bind(user_id)
        .bind(amount)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO wallet_entries (user_id, entry_type, amount, description)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(entry_type)
    .bind(amount)
    .bind(description)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Queue an in-app alert inside the caller's transaction
pub(crate) async fn notify(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    message: &str,
) -> Result<()> {
    sqlx::query("INSERT INTO alerts (user_id, message) VALUES ($1, $2)")
        .bind(user_id)
        .bind(message)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

//! Integration tests for the infrastructure components
//!
//! These tests verify that PostgreSQL is reachable with the configured
//! credentials and that the embedded migrations apply cleanly.

use common::{
    config::AppConfig,
    database::{health_check, init_pool, run_migrations},
};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn database_connects_and_migrates() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let pool = init_pool(&config.database).await?;

    assert!(health_check(&pool).await?, "database health check failed");

    run_migrations(&pool).await?;

    // The schema is in place once the core tables answer queries.
    let row = sqlx::query("SELECT COUNT(*) AS n FROM contests")
        .fetch_one(&pool)
        .await?;
    let n: i64 = row.get("n");
    assert!(n >= 0);

    // Migrations must be re-runnable.
    run_migrations(&pool).await?;

    Ok(())
}

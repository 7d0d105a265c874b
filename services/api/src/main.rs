use anyhow::Result;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod jobs;
mod jwt;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
mod validation;

use common::config::AppConfig;
use common::database::{health_check, init_pool, run_migrations};
use tokio::net::TcpListener;

use crate::{jwt::JwtService, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_max_level(Level::INFO)
        .init();

    info!("Starting contest service");

    let config = AppConfig::load()?;

    // Initialize database connection pool
    let pool = init_pool(&config.database).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;
    info!("Database migrations applied");

    if config.webhook.secret.is_empty() {
        warn!("Webhook secret is not configured; deployment webhooks will be rejected");
    }

    let jwt_service = JwtService::new(&config.auth);
    let app_state = AppState::new(pool.clone(), jwt_service, &config);

    // Scheduler must stay alive for the jobs to keep firing
    let _scheduler = jobs::start_scheduler(&config.jobs, pool).await?;

    // Start the web server
    let app = routes::create_router(app_state, &config.server.uploads_dir);

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Contest service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Application state shared across handlers

use sqlx::PgPool;

use common::config::AppConfig;

use crate::jwt::JwtService;
use crate::repositories::{
    AlertRepository, CompetitionRepository, ContestRepository, ReportRepository, StatsRepository,
    ThemeRepository, UserRepository, VoteRepository, WalletRepository, WinnerRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub signup_bonus: i64,
    pub referral_bonus: i64,
    pub webhook_secret: String,
    pub user_repository: UserRepository,
    pub wallet_repository: WalletRepository,
    pub theme_repository: ThemeRepository,
    pub contest_repository: ContestRepository,
    pub competition_repository: CompetitionRepository,
    pub vote_repository: VoteRepository,
    pub report_repository: ReportRepository,
    pub winner_repository: WinnerRepository,
    pub alert_repository: AlertRepository,
    pub stats_repository: StatsRepository,
}

impl AppState {
    /// Build the shared state from a connected pool and the configuration
    pub fn new(pool: PgPool, jwt_service: JwtService, config: &AppConfig) -> Self {
        AppState {
            db_pool: pool.clone(),
            jwt_service,
            signup_bonus: config.rewards.signup_bonus,
            referral_bonus: config.rewards.referral_bonus,
            webhook_secret: config.webhook.secret.clone(),
            user_repository: UserRepository::new(pool.clone()),
            wallet_repository: WalletRepository::new(pool.clone()),
            theme_repository: ThemeRepository::new(pool.clone()),
            contest_repository: ContestRepository::new(pool.clone()),
            competition_repository: CompetitionRepository::new(pool.clone()),
            vote_repository: VoteRepository::new(pool.clone()),
            report_repository: ReportRepository::new(pool.clone()),
            winner_repository: WinnerRepository::new(pool.clone()),
            alert_repository: AlertRepository::new(pool.clone()),
            stats_repository: StatsRepository::new(pool),
        }
    }
}

//! Repositories for database operations

pub mod alerts;
pub mod competitions;
pub mod contests;
pub mod reports;
pub mod stats;
pub mod themes;
pub mod users;
pub mod votes;
pub mod wallets;
pub mod winners;

pub use alerts::AlertRepository;
pub use competitions::{CompetitionRepository, EntryOutcome};
pub use contests::ContestRepository;
pub use reports::ReportRepository;
pub use stats::StatsRepository;
pub use themes::ThemeRepository;
pub use users::{ProfileOutcome, RegisterOutcome, UserRepository};
pub use votes::{CastOutcome, VoteRepository};
pub use wallets::WalletRepository;
pub use winners::WinnerRepository;

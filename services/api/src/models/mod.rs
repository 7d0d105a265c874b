//! Contest service models

pub mod alert;
pub mod competition;
pub mod contest;
pub mod report;
pub mod stats;
pub mod theme;
pub mod user;
pub mod vote;
pub mod wallet;
pub mod winner;

// Re-export for convenience
pub use alert::Alert;
pub use competition::{Competition, CompetitionStatus, VotingEntry};
pub use contest::{Contest, ContestStatus, NewContest, UpdateContest};
pub use report::{NewReport, Report, ReportStatus};
pub use stats::{
    LeaderboardRow, MetricsOverview, WeeklyCompetitorStats, WeeklyRankRow, WeeklyReportStats,
    WeeklyVoterStats,
};
pub use theme::{NewTheme, Theme, UpdateTheme};
pub use user::{ModerationUpdate, NewUser, ReferredUser, UpdateProfile, User, UserRole};
pub use vote::VoteActivity;
pub use wallet::{Wallet, WalletEntry, WalletEntryType};
pub use winner::WinnerRecord;

//! Shared infrastructure for the contest backend
//!
//! Configuration loading, PostgreSQL connectivity and migrations, error
//! types, and the ISO-week window math used by the weekly jobs and the
//! leaderboard queries.

pub mod config;
pub mod database;
pub mod error;
pub mod week;

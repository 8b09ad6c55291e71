//! HTTP handlers for the JSON API.

pub mod assessments;
pub mod benchmarks;
pub mod dashboard;
pub mod leaderboard;
pub mod sports;
pub mod system;
pub mod users;

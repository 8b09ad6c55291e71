//! talentscope-web: JSON API over the assessment workflow.
//! Provides:
//!   - User registration and profiles
//!   - Assessment submission, verification and comments
//!   - Leaderboards, cohort benchmarks and role dashboards
//!   - Live assessment and benchmark events over SSE

pub mod config;
pub mod handlers;
pub mod router;
pub mod sse;
pub mod state;

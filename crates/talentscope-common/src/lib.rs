//! talentscope-common: shared types, errors, and cohort classification used across all TalentScope crates.

pub mod error;
pub mod entities;
pub mod cohort;

// Re-export commonly used types
pub use cohort::{classify, AgeGroup, CohortKey};
pub use entities::{Assessment, Gender, TestType, User, UserRole, VerificationStatus};
pub use error::{ApiError, ScoringError};

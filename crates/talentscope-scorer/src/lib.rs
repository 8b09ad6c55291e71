//! talentscope-scorer: cohort percentile scoring and the assessment workflow built on it.

pub mod analysis_provider;
pub mod catalogue;
pub mod error;
pub mod locks;
pub mod normalise;
pub mod queries;
pub mod scorer;
pub mod service;
pub mod suggestions;

pub use analysis_provider::{AnalysisProvider, AnalysisReport, FixedAnalysisProvider, SimulatedAnalysisProvider};
pub use catalogue::{CategoryInfo, TestCategory, TestInfo};
pub use error::{Result, ServiceError};
pub use queries::{
    AssessmentStats, AthleteListing, AthleteSummary, DashboardStats, LeaderboardEntry, Page, PendingAssessment,
    PointsEntry, UserFilter, DEFAULT_POINTS_BOARD,
};
pub use scorer::{benchmark_for, score_and_benchmark, ScoreInput, DEFAULT_PERCENTILE};
pub use service::{
    AssessmentService, BulkVerification, BulkVerifyOutcome, NewAssessment, NewComment, NewUser, ProfileUpdate,
    SkippedAssessment, SubmitOutcome, Verification, VerifyOutcome,
};
pub use suggestions::{Priority, Suggestion};

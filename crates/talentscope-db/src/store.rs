//! Score store: persistence for users, assessments and cohort benchmarks.
//!
//! Two implementations ship: [`crate::LanceScoreStore`] over the embedded
//! LanceDB database and [`crate::MemoryScoreStore`] for tests and
//! ephemeral runs. Callers hold an `Arc<dyn ScoreStore>` and never know which.

use async_trait::async_trait;
use std::cmp::Ordering;
use talentscope_common::entities::{Assessment, CohortBenchmark, TestType, User, UserRole, VerificationStatus};
use talentscope_common::CohortKey;
use uuid::Uuid;

use crate::error::{DbError, Result};

#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Insert a new user. Fails with `Duplicate` if the email is taken.
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn update_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<User>>;

    async fn insert_assessment(&self, assessment: &Assessment) -> Result<()>;

    /// Replace a stored assessment. Fails with `NotFound` if it was never inserted.
    async fn update_assessment(&self, assessment: &Assessment) -> Result<()>;

    async fn get_assessment(&self, id: Uuid) -> Result<Option<Assessment>>;

    /// Assessments matching `query`, ordered and paged as it requests.
    async fn query_assessments(&self, query: &AssessmentQuery) -> Result<Vec<Assessment>>;

    /// Number of assessments matching `query`, ignoring paging.
    async fn count_assessments(&self, query: &AssessmentQuery) -> Result<u64>;

    /// Normalized scores of every verified assessment in `cohort`, optionally
    /// leaving one assessment out.
    async fn cohort_scores(&self, cohort: CohortKey, exclude: Option<Uuid>) -> Result<Vec<f64>>;

    async fn upsert_benchmark(&self, benchmark: &CohortBenchmark) -> Result<()>;

    async fn get_benchmark(&self, cohort: CohortKey) -> Result<Option<CohortBenchmark>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recent test date first.
    #[default]
    NewestFirst,
    /// Highest normalized score first; unscored records last.
    ScoreDesc,
}

/// Filter, ordering and paging for assessment listings.
#[derive(Debug, Clone, Default)]
pub struct AssessmentQuery {
    pub athlete_id: Option<Uuid>,
    pub test_type: Option<TestType>,
    pub status: Option<VerificationStatus>,
    pub scored_only: bool,
    pub order: SortOrder,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl AssessmentQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_athlete(athlete_id: Uuid) -> Self {
        Self { athlete_id: Some(athlete_id), ..Self::default() }
    }

    pub fn test_type(mut self, test_type: TestType) -> Self {
        self.test_type = Some(test_type);
        self
    }

    pub fn status(mut self, status: VerificationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn scored_only(mut self) -> Self {
        self.scored_only = true;
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, a: &Assessment) -> bool {
        self.athlete_id.map_or(true, |id| a.athlete_id == id)
            && self.test_type.map_or(true, |t| a.test_type == t)
            && self.status.map_or(true, |s| a.verification_status == s)
            && (!self.scored_only || a.normalized_score.is_some())
    }

    /// SQL predicate equivalent of [`Self::matches`], or `None` for "everything".
    pub fn to_filter(&self) -> Option<String> {
        let mut clauses = Vec::new();
        if let Some(id) = self.athlete_id {
            clauses.push(format!("athlete_id = '{}'", id));
        }
        if let Some(t) = self.test_type {
            clauses.push(format!("test_type = '{}'", t.as_str()));
        }
        if let Some(s) = self.status {
            clauses.push(format!("verification_status = '{}'", s.as_str()));
        }
        if self.scored_only {
            clauses.push("normalized_score IS NOT NULL".to_string());
        }
        if clauses.is_empty() { None } else { Some(clauses.join(" AND ")) }
    }

    /// Sort and page an already-filtered result set.
    pub fn arrange(&self, mut rows: Vec<Assessment>) -> Vec<Assessment> {
        match self.order {
            SortOrder::NewestFirst => rows.sort_by(|a, b| b.test_date.cmp(&a.test_date)),
            SortOrder::ScoreDesc => rows.sort_by(|a, b| match (a.normalized_score, b.normalized_score) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }),
        }
        let rows = rows.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        }
    }
}

/// Reject records the scorer could never rank correctly.
pub fn validate_assessment(assessment: &Assessment) -> Result<()> {
    if let Some(score) = assessment.normalized_score {
        if !score.is_finite() || score < 0.0 {
            return Err(DbError::InvalidRecord(format!(
                "assessment {} has invalid normalized score {}",
                assessment.id, score
            )));
        }
    }
    Ok(())
}

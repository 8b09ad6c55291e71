//! [`ScoreStore`] over the embedded LanceDB database.

use async_trait::async_trait;
use std::sync::Arc;
use talentscope_common::entities::{Assessment, CohortBenchmark, User, UserRole};
use talentscope_common::CohortKey;
use uuid::Uuid;

use crate::assessments::AssessmentRepository;
use crate::benchmarks::BenchmarkRepository;
use crate::database::Database;
use crate::error::{DbError, Result};
use crate::store::{validate_assessment, AssessmentQuery, ScoreStore};
use crate::users::UserRepository;

#[derive(Clone)]
pub struct LanceScoreStore {
    db: Arc<Database>,
    users: UserRepository,
    assessments: AssessmentRepository,
    benchmarks: BenchmarkRepository,
}

impl LanceScoreStore {
    /// Open the database at `path` and create any missing tables.
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let db = Database::open(path).await?;
        db.initialize().await?;
        Ok(Self::new(Arc::new(db)))
    }

    pub fn new(db: Arc<Database>) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            assessments: AssessmentRepository::new(db.clone()),
            benchmarks: BenchmarkRepository::new(db.clone()),
            db,
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

#[async_trait]
impl ScoreStore for LanceScoreStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        if self.users.find_by_email(&user.email).await?.is_some() {
            return Err(DbError::Duplicate(format!("email {}", user.email)));
        }
        if self.users.find_by_id(user.id).await?.is_some() {
            return Err(DbError::Duplicate(format!("user {}", user.id)));
        }
        self.users.insert(user).await
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        if self.users.find_by_id(user.id).await?.is_none() {
            return Err(DbError::NotFound(format!("user {}", user.id)));
        }
        self.users.update(user).await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.find_by_email(email).await
    }

    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<User>> {
        let mut users = match role {
            Some(role) => self.users.find_by_role(role).await?,
            None => self.users.list().await?,
        };
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn insert_assessment(&self, assessment: &Assessment) -> Result<()> {
        validate_assessment(assessment)?;
        if self.assessments.find_by_id(assessment.id).await?.is_some() {
            return Err(DbError::Duplicate(format!("assessment {}", assessment.id)));
        }
        self.assessments.insert(assessment).await
    }

    async fn update_assessment(&self, assessment: &Assessment) -> Result<()> {
        validate_assessment(assessment)?;
        if self.assessments.find_by_id(assessment.id).await?.is_none() {
            return Err(DbError::NotFound(format!("assessment {}", assessment.id)));
        }
        self.assessments.update(assessment).await
    }

    async fn get_assessment(&self, id: Uuid) -> Result<Option<Assessment>> {
        self.assessments.find_by_id(id).await
    }

    async fn query_assessments(&self, query: &AssessmentQuery) -> Result<Vec<Assessment>> {
        // Lance has no ORDER BY on plain scans; order and page after the filter.
        let rows = self.assessments.find_where(query.to_filter()).await?;
        Ok(query.arrange(rows))
    }

    async fn count_assessments(&self, query: &AssessmentQuery) -> Result<u64> {
        self.assessments.count_where(query.to_filter()).await
    }

    async fn cohort_scores(&self, cohort: CohortKey, exclude: Option<Uuid>) -> Result<Vec<f64>> {
        self.assessments.cohort_scores(cohort, exclude).await
    }

    async fn upsert_benchmark(&self, benchmark: &CohortBenchmark) -> Result<()> {
        self.benchmarks.upsert(benchmark).await
    }

    async fn get_benchmark(&self, cohort: CohortKey) -> Result<Option<CohortBenchmark>> {
        self.benchmarks.find(cohort).await
    }
}

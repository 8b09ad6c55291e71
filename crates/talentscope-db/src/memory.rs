//! In-process score store.

use async_trait::async_trait;
use std::collections::HashMap;
use talentscope_common::entities::{Assessment, CohortBenchmark, User, UserRole};
use talentscope_common::CohortKey;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::store::{validate_assessment, AssessmentQuery, ScoreStore};

/// Score store kept entirely in memory; contents vanish with the process.
#[derive(Default)]
pub struct MemoryScoreStore {
    users: RwLock<HashMap<Uuid, User>>,
    assessments: RwLock<HashMap<Uuid, Assessment>>,
    benchmarks: RwLock<HashMap<CohortKey, CohortBenchmark>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(DbError::Duplicate(format!("email {}", user.email)));
        }
        if users.contains_key(&user.id) {
            return Err(DbError::Duplicate(format!("user {}", user.id)));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(DbError::NotFound(format!("user {}", user.id))),
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_lowercase();
        Ok(self.users.read().await.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let mut out: Vec<User> = users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(out)
    }

    async fn insert_assessment(&self, assessment: &Assessment) -> Result<()> {
        validate_assessment(assessment)?;
        let mut assessments = self.assessments.write().await;
        if assessments.contains_key(&assessment.id) {
            return Err(DbError::Duplicate(format!("assessment {}", assessment.id)));
        }
        assessments.insert(assessment.id, assessment.clone());
        Ok(())
    }

    async fn update_assessment(&self, assessment: &Assessment) -> Result<()> {
        validate_assessment(assessment)?;
        let mut assessments = self.assessments.write().await;
        match assessments.get_mut(&assessment.id) {
            Some(slot) => {
                *slot = assessment.clone();
                Ok(())
            }
            None => Err(DbError::NotFound(format!("assessment {}", assessment.id))),
        }
    }

    async fn get_assessment(&self, id: Uuid) -> Result<Option<Assessment>> {
        Ok(self.assessments.read().await.get(&id).cloned())
    }

    async fn query_assessments(&self, query: &AssessmentQuery) -> Result<Vec<Assessment>> {
        let assessments = self.assessments.read().await;
        let rows = assessments.values().filter(|a| query.matches(a)).cloned().collect();
        Ok(query.arrange(rows))
    }

    async fn count_assessments(&self, query: &AssessmentQuery) -> Result<u64> {
        let assessments = self.assessments.read().await;
        Ok(assessments.values().filter(|a| query.matches(a)).count() as u64)
    }

    async fn cohort_scores(&self, cohort: CohortKey, exclude: Option<Uuid>) -> Result<Vec<f64>> {
        let assessments = self.assessments.read().await;
        Ok(assessments
            .values()
            .filter(|a| a.is_verified() && a.cohort() == cohort && Some(a.id) != exclude)
            .filter_map(|a| a.normalized_score)
            .collect())
    }

    async fn upsert_benchmark(&self, benchmark: &CohortBenchmark) -> Result<()> {
        self.benchmarks.write().await.insert(benchmark.cohort(), benchmark.clone());
        Ok(())
    }

    async fn get_benchmark(&self, cohort: CohortKey) -> Result<Option<CohortBenchmark>> {
        Ok(self.benchmarks.read().await.get(&cohort).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talentscope_common::entities::VerificationStatus;
    use talentscope_common::{AgeGroup, Gender, TestType};
    use talentscope_test_utils::{athlete, scored_assessment};

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryScoreStore::new();
        let first = athlete("Ravi", 17, Gender::Male);
        let mut second = athlete("Ravi Two", 18, Gender::Male);
        second.email = first.email.clone();

        store.insert_user(&first).await.unwrap();
        let err = store.insert_user(&second).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
        assert!(store.find_user_by_email(&first.email.to_uppercase()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cohort_scores_only_verified_in_cohort() {
        let store = MemoryScoreStore::new();
        let cohort = CohortKey::new(TestType::SitUps, AgeGroup::From16To18, Gender::Female);
        let athlete_id = Uuid::new_v4();

        let verified = scored_assessment(athlete_id, cohort, 70.0, VerificationStatus::Verified);
        let pending = scored_assessment(athlete_id, cohort, 80.0, VerificationStatus::Pending);
        let other = scored_assessment(
            athlete_id,
            CohortKey::new(TestType::SitUps, AgeGroup::Over22, Gender::Female),
            90.0,
            VerificationStatus::Verified,
        );
        for a in [&verified, &pending, &other] {
            store.insert_assessment(a).await.unwrap();
        }

        assert_eq!(store.cohort_scores(cohort, None).await.unwrap(), vec![70.0]);
        assert!(store.cohort_scores(cohort, Some(verified.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_assessment_is_not_found() {
        let store = MemoryScoreStore::new();
        let cohort = CohortKey::new(TestType::ShuttleRun, AgeGroup::Under16, Gender::Other);
        let a = scored_assessment(Uuid::new_v4(), cohort, 10.0, VerificationStatus::Pending);
        assert!(matches!(store.update_assessment(&a).await, Err(DbError::NotFound(_))));
    }
}

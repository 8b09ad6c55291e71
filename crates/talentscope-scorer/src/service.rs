//! Assessment workflow: registration, submission, verification and comments.
//!
//! Every step that ranks a score against its cohort, or rewrites the cohort
//! aggregate, runs under that cohort's lock. Records are re-read once the
//! lock is held. Changes to a user's points or profile run under that user's
//! lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use talentscope_common::entities::{
    Assessment, CohortBenchmark, Comment, CommentKind, Gender, RawMeasurements, TestConditions, TestType, User,
    UserRole, VerificationStatus,
};
use talentscope_common::{classify, CohortKey};
use talentscope_db::{AssessmentQuery, ScoreStore};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis_provider::AnalysisProvider;
use crate::error::{Result, ServiceError};
use crate::locks::{CohortLocks, UserLocks};
use crate::normalise::normalise;
use crate::scorer::{benchmark_for, score_and_benchmark, ScoreInput};
use crate::suggestions::{improvement_suggestions, Suggestion};

const MAX_NOTES_CHARS: usize = 500;
const MAX_COMMENT_CHARS: usize = 500;
pub const MAX_BULK_VERIFY: usize = 100;

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub specialization: Option<String>,
}

/// Profile fields a user may change. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAssessment {
    pub athlete_id: Uuid,
    pub test_type: TestType,
    /// Defaults to now.
    pub test_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub raw_data: RawMeasurements,
    pub video_url: Option<String>,
    pub video_duration_secs: Option<f64>,
    pub test_conditions: Option<TestConditions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Verification {
    pub official_id: Uuid,
    pub status: VerificationStatus,
    pub notes: Option<String>,
}

/// One decision applied to many pending assessments.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkVerification {
    pub official_id: Uuid,
    pub assessment_ids: Vec<Uuid>,
    pub status: VerificationStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub author_id: Uuid,
    pub content: String,
    pub kind: CommentKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub assessment: Assessment,
    pub points_awarded: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOutcome {
    pub assessment: Assessment,
    /// Set when the cohort aggregate was recomputed.
    pub benchmark: Option<CohortBenchmark>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedAssessment {
    pub id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkVerifyOutcome {
    pub status: VerificationStatus,
    pub modified: Vec<Uuid>,
    pub skipped: Vec<SkippedAssessment>,
    /// Aggregates recomputed because their verified set grew.
    pub benchmarks: Vec<CohortBenchmark>,
}

impl BulkVerifyOutcome {
    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }
}

pub struct AssessmentService {
    pub(crate) store: Arc<dyn ScoreStore>,
    analysis: Arc<dyn AnalysisProvider>,
    locks: CohortLocks,
    user_locks: UserLocks,
}

impl AssessmentService {
    pub fn new(store: Arc<dyn ScoreStore>, analysis: Arc<dyn AnalysisProvider>) -> Self {
        Self { store, analysis, locks: CohortLocks::new(), user_locks: UserLocks::new() }
    }

    pub fn store(&self) -> &Arc<dyn ScoreStore> {
        &self.store
    }

    pub fn analysis_provider(&self) -> &dyn AnalysisProvider {
        self.analysis.as_ref()
    }

    // ── Users ──────────────────────────────────────────────────────────────

    pub async fn register_user(&self, req: NewUser) -> Result<User> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("Name is required".into()));
        }
        let email = req.email.trim();
        if !email.contains('@') {
            return Err(ServiceError::Validation(format!("Invalid email '{email}'")));
        }
        if req.date_of_birth > Utc::now().date_naive() {
            return Err(ServiceError::Validation("Date of birth is in the future".into()));
        }

        let mut user = User::new(name.to_string(), email.to_string(), req.role, req.date_of_birth, req.gender);
        user.city = req.city;
        user.state = req.state;
        user.specialization = req.specialization;

        self.store.insert_user(&user).await?;
        info!(user_id = %user.id, role = user.role.as_str(), "Registered user");
        Ok(user)
    }

    pub async fn user(&self, id: Uuid) -> Result<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".into()))
    }

    pub(crate) async fn user_with_role(&self, id: Uuid, allowed: &[UserRole], action: &str) -> Result<User> {
        let user = self.user(id).await?;
        if !allowed.contains(&user.role) {
            return Err(ServiceError::Forbidden(format!(
                "Role '{}' cannot {action}",
                user.role.as_str()
            )));
        }
        Ok(user)
    }

    /// Apply a profile change. Name is 2 to 100 characters; city, state and
    /// specialization at least 2.
    pub async fn update_profile(&self, id: Uuid, req: ProfileUpdate) -> Result<User> {
        let name = trimmed_field("Name", req.name.as_deref(), 2, Some(100))?;
        let city = trimmed_field("City", req.city.as_deref(), 2, None)?;
        let state = trimmed_field("State", req.state.as_deref(), 2, None)?;
        let specialization = trimmed_field("Specialization", req.specialization.as_deref(), 2, None)?;

        let _guard = self.user_locks.acquire(id).await;
        let mut user = self.user(id).await?;
        if let Some(name) = name {
            user.name = name;
        }
        if let Some(city) = city {
            user.city = city;
        }
        if let Some(state) = state {
            user.state = state;
        }
        if specialization.is_some() {
            user.specialization = specialization;
        }
        self.store.update_user(&user).await?;

        info!(user_id = %id, "Profile updated");
        Ok(user)
    }

    // ── Assessments ────────────────────────────────────────────────────────

    pub async fn assessment(&self, id: Uuid) -> Result<Assessment> {
        self.store
            .get_assessment(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Assessment".into()))
    }

    /// Lock the assessment's cohort and read the record afresh under it.
    /// The cohort of a record never changes, so the first read only picks
    /// the lock.
    async fn locked_assessment(&self, id: Uuid) -> Result<(OwnedMutexGuard<()>, Assessment)> {
        let cohort = self.assessment(id).await?.cohort();
        let guard = self.locks.acquire(cohort).await;
        let assessment = self.assessment(id).await?;
        Ok((guard, assessment))
    }

    /// Record a new assessment for an athlete.
    ///
    /// The record is ranked against the cohort's verified scores and then
    /// stored pending, all under the cohort lock. When it cannot be ranked it
    /// is stored without a percentile.
    pub async fn submit(&self, req: NewAssessment) -> Result<SubmitOutcome> {
        let athlete = self
            .user_with_role(req.athlete_id, &[UserRole::Athlete], "submit assessments")
            .await?;

        if req.test_type.requires_video() && req.video_url.is_none() {
            return Err(ServiceError::Validation(format!(
                "A video is required for {}",
                req.test_type.display_name()
            )));
        }

        let test_date = req.test_date.unwrap_or_else(Utc::now);
        let age_group = classify(athlete.age_on(test_date.date_naive()))?;

        let report = self.analysis.analyse(req.test_type, &req.raw_data);
        debug!(provider = self.analysis.name(), confidence = report.analysis.confidence, "Analysis complete");

        // Serialises attempt numbering and the points award per athlete.
        let _athlete_guard = self.user_locks.acquire(athlete.id).await;

        let previous = self
            .store
            .count_assessments(&AssessmentQuery::for_athlete(athlete.id).test_type(req.test_type))
            .await?;

        let mut assessment = Assessment::new(athlete.id, req.test_type, age_group, athlete.gender);
        assessment.test_date = test_date;
        assessment.video_url = req.video_url;
        assessment.video_duration_secs = req.video_duration_secs;
        assessment.test_conditions = req.test_conditions;
        assessment.attempt_number = previous as u32 + 1;
        assessment.normalized_score = normalise(req.test_type, &report.raw);
        assessment.raw_data = report.raw;
        assessment.ai_analysis = report.analysis;

        {
            let _guard = self.locks.acquire(assessment.cohort()).await;
            let peers = self.store.cohort_scores(assessment.cohort(), None).await?;
            match score_and_benchmark(&ScoreInput::from(&assessment), &peers) {
                Ok((percentile, benchmark)) => {
                    assessment.percentile = Some(percentile);
                    assessment.benchmark = Some(benchmark);
                }
                Err(e) => {
                    warn!(assessment_id = %assessment.id, error = %e, "Assessment left unranked");
                }
            }
            self.store.insert_assessment(&assessment).await?;
        }

        let points_awarded = assessment
            .normalized_score
            .map(|s| (s / 10.0).floor() as u32)
            .unwrap_or(0);
        if points_awarded > 0 {
            let mut user = self.user(athlete.id).await?;
            user.points = user.points.saturating_add(points_awarded);
            self.store.update_user(&user).await?;
        }

        info!(
            assessment_id = %assessment.id,
            test_type = assessment.test_type.as_str(),
            cohort = %assessment.cohort(),
            score = ?assessment.normalized_score,
            percentile = ?assessment.percentile,
            "Assessment submitted"
        );

        Ok(SubmitOutcome { assessment, points_awarded })
    }

    /// Apply an official's decision to an assessment.
    ///
    /// Moving into `verified` ranks the score against the other verified
    /// peers first; if that fails nothing is written. Any change in whether
    /// the record counts as verified recomputes the cohort aggregate.
    pub async fn verify(&self, id: Uuid, req: Verification) -> Result<VerifyOutcome> {
        validate_review(req.status, req.notes.as_deref())?;
        let official = self
            .user_with_role(req.official_id, &[UserRole::Official], "verify assessments")
            .await?;

        let (_guard, mut assessment) = self.locked_assessment(id).await?;
        let cohort = assessment.cohort();

        let was_verified = assessment.is_verified();
        self.apply_review(&mut assessment, official.id, req.status, req.notes)
            .await
            .inspect_err(|e| warn!(assessment_id = %id, error = %e, "Verification refused"))?;
        self.store.update_assessment(&assessment).await?;

        info!(assessment_id = %id, status = req.status.as_str(), official_id = %official.id, "Assessment reviewed");

        let benchmark = if was_verified != assessment.is_verified() {
            Some(self.recompute_cohort(cohort).await?)
        } else {
            None
        };

        Ok(VerifyOutcome { assessment, benchmark })
    }

    /// Apply one decision to many assessments. Only pending records change;
    /// the rest, and any that cannot be ranked, are reported as skipped.
    /// Each cohort is processed under its lock and its aggregate recomputed
    /// once if its verified set grew.
    pub async fn bulk_verify(&self, req: BulkVerification) -> Result<BulkVerifyOutcome> {
        if req.assessment_ids.is_empty() {
            return Err(ServiceError::Validation("Assessment IDs are required".into()));
        }
        if req.assessment_ids.len() > MAX_BULK_VERIFY {
            return Err(ServiceError::Validation(format!(
                "At most {MAX_BULK_VERIFY} assessments can be reviewed at once"
            )));
        }
        validate_review(req.status, req.notes.as_deref())?;
        let official = self
            .user_with_role(req.official_id, &[UserRole::Official], "verify assessments")
            .await?;

        let mut skipped = Vec::new();
        let mut seen = HashSet::new();
        let mut by_cohort: HashMap<CohortKey, Vec<Uuid>> = HashMap::new();
        let mut order = Vec::new();
        for &id in &req.assessment_ids {
            if !seen.insert(id) {
                continue;
            }
            match self.store.get_assessment(id).await? {
                Some(a) => {
                    let cohort = a.cohort();
                    if !by_cohort.contains_key(&cohort) {
                        order.push(cohort);
                    }
                    by_cohort.entry(cohort).or_default().push(id);
                }
                None => skipped.push(SkippedAssessment { id, reason: "Assessment not found".into() }),
            }
        }

        let mut modified = Vec::new();
        let mut benchmarks = Vec::new();
        for cohort in order {
            let ids = by_cohort.remove(&cohort).unwrap_or_default();
            let _guard = self.locks.acquire(cohort).await;

            let mut grew = false;
            for id in ids {
                let mut assessment = self.assessment(id).await?;
                if assessment.verification_status != VerificationStatus::Pending {
                    skipped.push(SkippedAssessment { id, reason: "Assessment is not pending".into() });
                    continue;
                }
                if let Err(e) = self.apply_review(&mut assessment, official.id, req.status, req.notes.clone()).await {
                    warn!(assessment_id = %id, error = %e, "Bulk verification skipped record");
                    skipped.push(SkippedAssessment { id, reason: e.to_string() });
                    continue;
                }
                self.store.update_assessment(&assessment).await?;
                grew |= assessment.is_verified();
                modified.push(id);
            }

            if grew {
                benchmarks.push(self.recompute_cohort(cohort).await?);
            }
        }

        info!(
            status = req.status.as_str(),
            official_id = %official.id,
            modified = modified.len(),
            skipped = skipped.len(),
            "Bulk verification"
        );

        Ok(BulkVerifyOutcome { status: req.status, modified, skipped, benchmarks })
    }

    /// Set the review fields. Entering `verified` ranks the record against
    /// the other verified peers first and leaves it untouched on failure.
    /// Callers hold the cohort lock.
    async fn apply_review(
        &self,
        assessment: &mut Assessment,
        official_id: Uuid,
        status: VerificationStatus,
        notes: Option<String>,
    ) -> Result<()> {
        if status == VerificationStatus::Verified {
            let peers = self.store.cohort_scores(assessment.cohort(), Some(assessment.id)).await?;
            let (percentile, benchmark) = score_and_benchmark(&ScoreInput::from(&*assessment), &peers)?;
            assessment.percentile = Some(percentile);
            assessment.benchmark = Some(benchmark);
        }

        assessment.verification_status = status;
        assessment.verified_by = Some(official_id);
        assessment.verification_date = Some(Utc::now());
        assessment.verification_notes = notes;
        assessment.touch();
        Ok(())
    }

    /// Rebuild the stored aggregate from every verified score in `cohort`.
    /// Callers hold the cohort lock.
    async fn recompute_cohort(&self, cohort: CohortKey) -> Result<CohortBenchmark> {
        let scores = self.store.cohort_scores(cohort, None).await?;
        let benchmark = CohortBenchmark {
            aggregate: benchmark_for(cohort, &scores)?,
            sample_size: scores.len(),
            updated_at: Utc::now(),
        };
        self.store.upsert_benchmark(&benchmark).await?;
        info!(cohort = %cohort, sample_size = benchmark.sample_size, "Cohort benchmark updated");
        Ok(benchmark)
    }

    pub async fn add_comment(&self, id: Uuid, req: NewComment) -> Result<Assessment> {
        let content = req.content.trim();
        let len = content.chars().count();
        if len == 0 || len > MAX_COMMENT_CHARS {
            return Err(ServiceError::Validation(format!(
                "Comment must be between 1 and {MAX_COMMENT_CHARS} characters"
            )));
        }
        let author = self
            .user_with_role(req.author_id, &[UserRole::Coach, UserRole::Official], "comment on assessments")
            .await?;

        let (_guard, mut assessment) = self.locked_assessment(id).await?;
        assessment.comments.push(Comment {
            id: Uuid::new_v4(),
            author_id: author.id,
            content: content.to_string(),
            kind: req.kind,
            timestamp: Utc::now(),
        });
        assessment.touch();
        self.store.update_assessment(&assessment).await?;

        debug!(assessment_id = %id, author_id = %author.id, "Comment added");
        Ok(assessment)
    }

    pub async fn suggestions(&self, id: Uuid) -> Result<Vec<Suggestion>> {
        let assessment = self.assessment(id).await?;
        Ok(improvement_suggestions(assessment.ai_analysis.metrics.as_ref()))
    }

    /// Stored aggregate for a cohort.
    pub async fn benchmark(&self, cohort: CohortKey) -> Result<CohortBenchmark> {
        self.store
            .get_benchmark(cohort)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Benchmark for {cohort}")))
    }
}

fn validate_review(status: VerificationStatus, notes: Option<&str>) -> Result<()> {
    if status == VerificationStatus::Pending {
        return Err(ServiceError::Validation(
            "Status must be verified, flagged or rejected".into(),
        ));
    }
    if notes.is_some_and(|n| n.chars().count() > MAX_NOTES_CHARS) {
        return Err(ServiceError::Validation(format!(
            "Notes cannot exceed {MAX_NOTES_CHARS} characters"
        )));
    }
    Ok(())
}

/// Trim an optional text field and check its length in characters.
fn trimmed_field(label: &str, value: Option<&str>, min: usize, max: Option<usize>) -> Result<Option<String>> {
    let Some(value) = value.map(str::trim) else {
        return Ok(None);
    };
    let len = value.chars().count();
    if len < min || max.is_some_and(|max| len > max) {
        let bound = match max {
            Some(max) => format!("between {min} and {max}"),
            None => format!("at least {min}"),
        };
        return Err(ServiceError::Validation(format!("{label} must be {bound} characters")));
    }
    Ok(Some(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis_provider::FixedAnalysisProvider;
    use pretty_assertions::assert_eq;
    use talentscope_common::entities::PerformanceMetrics;
    use talentscope_common::{AgeGroup, ScoringError};
    use async_trait::async_trait;
    use talentscope_db::{DbError, MemoryScoreStore};
    use talentscope_test_utils::{athlete, coach, official, verified_cohort};

    fn jump(cm: f64) -> RawMeasurements {
        RawMeasurements { jump_height_cm: Some(cm), ..Default::default() }
    }

    fn service() -> AssessmentService {
        let analysis = FixedAnalysisProvider::new().with_confidence(0.8).with_metrics(PerformanceMetrics {
            consistency: 55.0,
            technique: 90.0,
            efficiency: 90.0,
        });
        AssessmentService::new(Arc::new(MemoryScoreStore::new()), Arc::new(analysis))
    }

    fn submission(athlete_id: Uuid, raw: RawMeasurements) -> NewAssessment {
        NewAssessment {
            athlete_id,
            test_type: TestType::VerticalJump,
            test_date: None,
            raw_data: raw,
            video_url: Some("https://videos.example.com/jump.webm".into()),
            video_duration_secs: Some(12.0),
            test_conditions: None,
        }
    }

    fn cohort() -> CohortKey {
        CohortKey::new(TestType::VerticalJump, AgeGroup::From16To18, Gender::Male)
    }

    async fn seed_peers(svc: &AssessmentService, scores: &[f64]) {
        for a in verified_cohort(cohort(), scores) {
            svc.store.insert_assessment(&a).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_submit_ranks_against_verified_peers() {
        let svc = service();
        let a = athlete("Arjun", 17, Gender::Male);
        svc.store.insert_user(&a).await.unwrap();
        seed_peers(&svc, &[25.0, 50.0, 100.0]).await;

        let out = svc.submit(submission(a.id, jump(60.0))).await.unwrap();
        assert_eq!(out.assessment.normalized_score, Some(75.0));
        assert_eq!(out.assessment.percentile, Some(67));
        assert_eq!(out.assessment.verification_status, VerificationStatus::Pending);
        assert_eq!(out.assessment.age_group, AgeGroup::From16To18);
        assert_eq!(out.points_awarded, 7);

        let stored = svc.assessment(out.assessment.id).await.unwrap();
        assert_eq!(stored.percentile, Some(67));
        assert_eq!(svc.user(a.id).await.unwrap().points, 7);
    }

    #[tokio::test]
    async fn test_submit_without_peers_gets_median() {
        let svc = service();
        let a = athlete("Kiran", 17, Gender::Male);
        svc.store.insert_user(&a).await.unwrap();

        let out = svc.submit(submission(a.id, jump(40.0))).await.unwrap();
        assert_eq!(out.assessment.percentile, Some(50));
        let bench = out.assessment.benchmark.unwrap();
        assert_eq!(bench.average_score, None);
    }

    #[tokio::test]
    async fn test_submit_unscored_test_has_no_percentile() {
        let svc = service();
        let a = athlete("Leela", 20, Gender::Female);
        svc.store.insert_user(&a).await.unwrap();

        let mut req = submission(a.id, RawMeasurements { flexibility_cm: Some(12.0), ..Default::default() });
        req.test_type = TestType::Flexibility;
        req.video_url = None;
        let out = svc.submit(req).await.unwrap();
        assert_eq!(out.assessment.normalized_score, None);
        assert_eq!(out.assessment.percentile, None);
        assert_eq!(out.points_awarded, 0);
    }

    #[tokio::test]
    async fn test_submit_requires_athlete_and_video() {
        let svc = service();
        let c = coach("Coach Das");
        let a = athlete("Vikram", 18, Gender::Male);
        svc.store.insert_user(&c).await.unwrap();
        svc.store.insert_user(&a).await.unwrap();

        assert!(matches!(svc.submit(submission(c.id, jump(50.0))).await, Err(ServiceError::Forbidden(_))));

        let mut req = submission(a.id, jump(50.0));
        req.video_url = None;
        assert!(matches!(svc.submit(req).await, Err(ServiceError::Validation(_))));
        assert!(matches!(
            svc.submit(submission(Uuid::new_v4(), jump(50.0))).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_attempt_numbers_increase() {
        let svc = service();
        let a = athlete("Neha", 17, Gender::Female);
        svc.store.insert_user(&a).await.unwrap();

        let first = svc.submit(submission(a.id, jump(50.0))).await.unwrap();
        let second = svc.submit(submission(a.id, jump(55.0))).await.unwrap();
        assert_eq!(first.assessment.attempt_number, 1);
        assert_eq!(second.assessment.attempt_number, 2);
    }

    #[tokio::test]
    async fn test_verify_recomputes_cohort_aggregate() {
        let svc = service();
        let a = athlete("Rohan", 17, Gender::Male);
        let o = official("Official Rao");
        svc.store.insert_user(&a).await.unwrap();
        svc.store.insert_user(&o).await.unwrap();
        seed_peers(&svc, &[20.0, 40.0]).await;

        let submitted = svc.submit(submission(a.id, jump(48.0))).await.unwrap().assessment;
        let out = svc
            .verify(
                submitted.id,
                Verification { official_id: o.id, status: VerificationStatus::Verified, notes: Some("Clean run".into()) },
            )
            .await
            .unwrap();

        assert!(out.assessment.is_verified());
        assert_eq!(out.assessment.verified_by, Some(o.id));
        assert_eq!(out.assessment.percentile, Some(100));
        // snapshot excludes the new score
        assert_eq!(out.assessment.benchmark.unwrap().average_score, Some(30.0));

        // persisted aggregate covers every verified score
        let bench = out.benchmark.unwrap();
        assert_eq!(bench.sample_size, 3);
        assert_eq!(bench.aggregate.average_score, Some(40.0));
        assert_eq!(svc.benchmark(cohort()).await.unwrap(), bench);
    }

    #[tokio::test]
    async fn test_unverify_drops_score_from_aggregate() {
        let svc = service();
        let a = athlete("Isha", 17, Gender::Male);
        let o = official("Official Sen");
        svc.store.insert_user(&a).await.unwrap();
        svc.store.insert_user(&o).await.unwrap();
        seed_peers(&svc, &[10.0]).await;

        let id = svc.submit(submission(a.id, jump(72.0))).await.unwrap().assessment.id;
        let verify = |status| Verification { official_id: o.id, status, notes: None };
        svc.verify(id, verify(VerificationStatus::Verified)).await.unwrap();
        let out = svc.verify(id, verify(VerificationStatus::Flagged)).await.unwrap();

        let bench = out.benchmark.unwrap();
        assert_eq!(bench.sample_size, 1);
        assert_eq!(bench.aggregate.average_score, Some(10.0));

        // flagged to rejected leaves the verified set alone
        let out = svc.verify(id, verify(VerificationStatus::Rejected)).await.unwrap();
        assert!(out.benchmark.is_none());
    }

    #[tokio::test]
    async fn test_verify_unscored_is_refused_and_stays_pending() {
        let svc = service();
        let a = athlete("Tara", 17, Gender::Male);
        let o = official("Official Iyer");
        svc.store.insert_user(&a).await.unwrap();
        svc.store.insert_user(&o).await.unwrap();

        let mut req = submission(a.id, RawMeasurements { strength_score: Some(40.0), ..Default::default() });
        req.test_type = TestType::StrengthTest;
        let id = svc.submit(req).await.unwrap().assessment.id;

        let err = svc
            .verify(id, Verification { official_id: o.id, status: VerificationStatus::Verified, notes: None })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Scoring(ScoringError::MissingScore)));

        let stored = svc.assessment(id).await.unwrap();
        assert_eq!(stored.verification_status, VerificationStatus::Pending);
        assert_eq!(stored.percentile, None);
    }

    #[tokio::test]
    async fn test_verify_validation_and_roles() {
        let svc = service();
        let a = athlete("Dev", 17, Gender::Male);
        let o = official("Official Khan");
        svc.store.insert_user(&a).await.unwrap();
        svc.store.insert_user(&o).await.unwrap();
        let id = svc.submit(submission(a.id, jump(50.0))).await.unwrap().assessment.id;

        let by_athlete = Verification { official_id: a.id, status: VerificationStatus::Verified, notes: None };
        assert!(matches!(svc.verify(id, by_athlete).await, Err(ServiceError::Forbidden(_))));

        let pending = Verification { official_id: o.id, status: VerificationStatus::Pending, notes: None };
        assert!(matches!(svc.verify(id, pending).await, Err(ServiceError::Validation(_))));

        let long = Verification { official_id: o.id, status: VerificationStatus::Flagged, notes: Some("x".repeat(501)) };
        assert!(matches!(svc.verify(id, long).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_comments_and_suggestions() {
        let svc = service();
        let a = athlete("Mira", 17, Gender::Female);
        let c = coach("Coach Pillai");
        svc.store.insert_user(&a).await.unwrap();
        svc.store.insert_user(&c).await.unwrap();
        let id = svc.submit(submission(a.id, jump(50.0))).await.unwrap().assessment.id;

        let comment = NewComment { author_id: c.id, content: "  Land softer  ".into(), kind: CommentKind::Feedback };
        let updated = svc.add_comment(id, comment).await.unwrap();
        assert_eq!(updated.comments.len(), 1);
        assert_eq!(updated.comments[0].content, "Land softer");

        let empty = NewComment { author_id: c.id, content: "   ".into(), kind: CommentKind::Feedback };
        assert!(matches!(svc.add_comment(id, empty).await, Err(ServiceError::Validation(_))));

        let by_athlete = NewComment { author_id: a.id, content: "me".into(), kind: CommentKind::Feedback };
        assert!(matches!(svc.add_comment(id, by_athlete).await, Err(ServiceError::Forbidden(_))));

        let areas: Vec<_> = svc.suggestions(id).await.unwrap().into_iter().map(|s| s.area).collect();
        assert_eq!(areas, vec!["Consistency".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_verifications_keep_aggregate_consistent() {
        let svc = Arc::new(service());
        let o = official("Official Paul");
        svc.store.insert_user(&o).await.unwrap();

        let mut ids = Vec::new();
        for i in 0..8 {
            let a = athlete(&format!("Runner {i}"), 17, Gender::Male);
            svc.store.insert_user(&a).await.unwrap();
            ids.push(svc.submit(submission(a.id, jump(40.0 + i as f64))).await.unwrap().assessment.id);
        }

        let handles: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let svc = Arc::clone(&svc);
                let official_id = o.id;
                tokio::spawn(async move {
                    svc.verify(id, Verification { official_id, status: VerificationStatus::Verified, notes: None })
                        .await
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(svc.benchmark(cohort()).await.unwrap().sample_size, 8);
    }

    #[tokio::test]
    async fn test_register_user_validation() {
        let svc = service();
        let req = NewUser {
            name: "  Asha  ".into(),
            email: "Asha@Example.com".into(),
            role: UserRole::Athlete,
            date_of_birth: NaiveDate::from_ymd_opt(2008, 5, 1).unwrap(),
            gender: Gender::Female,
            city: "Chennai".into(),
            state: "Tamil Nadu".into(),
            specialization: None,
        };
        let user = svc.register_user(req.clone()).await.unwrap();
        assert_eq!(user.name, "Asha");
        assert_eq!(user.email, "asha@example.com");

        assert!(matches!(svc.register_user(req.clone()).await, Err(ServiceError::Store(_))));

        let bad = NewUser { email: "nope".into(), ..req };
        assert!(matches!(svc.register_user(bad).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_queued_reviews_see_latest_status() {
        let svc = Arc::new(service());
        let a = athlete("Anil", 17, Gender::Male);
        let o = official("Official Bose");
        svc.store.insert_user(&a).await.unwrap();
        svc.store.insert_user(&o).await.unwrap();
        let id = svc.submit(submission(a.id, jump(60.0))).await.unwrap().assessment.id;

        // Both reviews read the record before the cohort is free.
        let guard = svc.locks.acquire(cohort()).await;
        let official_id = o.id;
        let review = |status| {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.verify(id, Verification { official_id, status, notes: None }).await })
        };
        let first = review(VerificationStatus::Verified);
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        let second = review(VerificationStatus::Flagged);
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        drop(guard);
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let stored = svc.assessment(id).await.unwrap();
        assert_eq!(stored.verification_status, VerificationStatus::Flagged);
        let verified = svc.store.cohort_scores(cohort(), None).await.unwrap().len();
        assert_eq!(verified, 0);
        assert_eq!(svc.benchmark(cohort()).await.unwrap().sample_size, verified);
    }

    #[tokio::test]
    async fn test_comment_during_review_keeps_verification() {
        let svc = Arc::new(service());
        let a = athlete("Gita", 17, Gender::Male);
        let c = coach("Coach Menon");
        let o = official("Official Nair");
        for u in [&a, &c, &o] {
            svc.store.insert_user(u).await.unwrap();
        }
        let id = svc.submit(submission(a.id, jump(60.0))).await.unwrap().assessment.id;

        let guard = svc.locks.acquire(cohort()).await;
        let verify = {
            let svc = Arc::clone(&svc);
            let official_id = o.id;
            tokio::spawn(async move {
                svc.verify(id, Verification { official_id, status: VerificationStatus::Verified, notes: None }).await
            })
        };
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        let comment = {
            let svc = Arc::clone(&svc);
            let author_id = c.id;
            tokio::spawn(async move {
                svc.add_comment(id, NewComment { author_id, content: "Good depth".into(), kind: CommentKind::Feedback })
                    .await
            })
        };
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        drop(guard);
        verify.await.unwrap().unwrap();
        comment.await.unwrap().unwrap();

        let stored = svc.assessment(id).await.unwrap();
        assert!(stored.is_verified());
        assert_eq!(stored.comments.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_keep_all_points() {
        let svc = service();
        let a = athlete("Sana", 17, Gender::Male);
        svc.store.insert_user(&a).await.unwrap();

        let (first, second) = tokio::join!(
            svc.submit(submission(a.id, jump(60.0))),
            svc.submit(submission(a.id, jump(60.0)))
        );
        let (first, second) = (first.unwrap(), second.unwrap());
        assert_eq!(first.points_awarded + second.points_awarded, 14);
        assert_eq!(svc.user(a.id).await.unwrap().points, 14);

        let mut attempts = vec![first.assessment.attempt_number, second.assessment.attempt_number];
        attempts.sort();
        assert_eq!(attempts, vec![1, 2]);
    }

    /// Memory store whose cohort score lookup always fails.
    struct ScoresUnavailable(MemoryScoreStore);

    #[async_trait]
    impl ScoreStore for ScoresUnavailable {
        async fn insert_user(&self, user: &User) -> talentscope_db::Result<()> {
            self.0.insert_user(user).await
        }
        async fn update_user(&self, user: &User) -> talentscope_db::Result<()> {
            self.0.update_user(user).await
        }
        async fn get_user(&self, id: Uuid) -> talentscope_db::Result<Option<User>> {
            self.0.get_user(id).await
        }
        async fn find_user_by_email(&self, email: &str) -> talentscope_db::Result<Option<User>> {
            self.0.find_user_by_email(email).await
        }
        async fn list_users(&self, role: Option<UserRole>) -> talentscope_db::Result<Vec<User>> {
            self.0.list_users(role).await
        }
        async fn insert_assessment(&self, assessment: &Assessment) -> talentscope_db::Result<()> {
            self.0.insert_assessment(assessment).await
        }
        async fn update_assessment(&self, assessment: &Assessment) -> talentscope_db::Result<()> {
            self.0.update_assessment(assessment).await
        }
        async fn get_assessment(&self, id: Uuid) -> talentscope_db::Result<Option<Assessment>> {
            self.0.get_assessment(id).await
        }
        async fn query_assessments(&self, query: &AssessmentQuery) -> talentscope_db::Result<Vec<Assessment>> {
            self.0.query_assessments(query).await
        }
        async fn count_assessments(&self, query: &AssessmentQuery) -> talentscope_db::Result<u64> {
            self.0.count_assessments(query).await
        }
        async fn cohort_scores(&self, _cohort: CohortKey, _exclude: Option<Uuid>) -> talentscope_db::Result<Vec<f64>> {
            Err(DbError::LanceDb("scores unavailable".into()))
        }
        async fn upsert_benchmark(&self, benchmark: &CohortBenchmark) -> talentscope_db::Result<()> {
            self.0.upsert_benchmark(benchmark).await
        }
        async fn get_benchmark(&self, cohort: CohortKey) -> talentscope_db::Result<Option<CohortBenchmark>> {
            self.0.get_benchmark(cohort).await
        }
    }

    #[tokio::test]
    async fn test_failed_ranking_lookup_stores_nothing() {
        let store = Arc::new(ScoresUnavailable(MemoryScoreStore::new()));
        let svc = AssessmentService::new(store.clone(), Arc::new(FixedAnalysisProvider::new()));
        let a = athlete("Ravi", 17, Gender::Male);
        store.insert_user(&a).await.unwrap();

        let err = svc.submit(submission(a.id, jump(60.0))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
        assert_eq!(store.count_assessments(&AssessmentQuery::all()).await.unwrap(), 0);
        assert_eq!(svc.user(a.id).await.unwrap().points, 0);
    }

    #[tokio::test]
    async fn test_bulk_verify_changes_pending_only() {
        let svc = service();
        let o = official("Official Roy");
        svc.store.insert_user(&o).await.unwrap();

        let mut ids = Vec::new();
        for (name, gender, cm) in [
            ("Amit", Gender::Male, 40.0),
            ("Bala", Gender::Male, 50.0),
            ("Chitra", Gender::Female, 45.0),
        ] {
            let a = athlete(name, 17, gender);
            svc.store.insert_user(&a).await.unwrap();
            ids.push(svc.submit(submission(a.id, jump(cm))).await.unwrap().assessment.id);
        }
        let d = athlete("Dinesh", 17, Gender::Male);
        svc.store.insert_user(&d).await.unwrap();
        let flagged = svc.submit(submission(d.id, jump(55.0))).await.unwrap().assessment.id;
        svc.verify(flagged, Verification { official_id: o.id, status: VerificationStatus::Flagged, notes: None })
            .await
            .unwrap();

        let missing = Uuid::new_v4();
        let out = svc
            .bulk_verify(BulkVerification {
                official_id: o.id,
                assessment_ids: vec![ids[0], ids[1], ids[2], flagged, missing, ids[0]],
                status: VerificationStatus::Verified,
                notes: Some("Batch review".into()),
            })
            .await
            .unwrap();

        assert_eq!(out.modified, ids);
        assert_eq!(out.modified_count(), 3);
        let skipped: Vec<_> = out.skipped.iter().map(|s| s.id).collect();
        assert_eq!(skipped, vec![missing, flagged]);
        assert_eq!(out.benchmarks.len(), 2);

        assert_eq!(svc.assessment(flagged).await.unwrap().verification_status, VerificationStatus::Flagged);
        let male = svc.benchmark(cohort()).await.unwrap();
        assert_eq!(male.sample_size, 2);
        assert_eq!(male.aggregate.average_score, Some(56.25));
        let female = CohortKey::new(TestType::VerticalJump, AgeGroup::From16To18, Gender::Female);
        assert_eq!(svc.benchmark(female).await.unwrap().sample_size, 1);
    }

    #[tokio::test]
    async fn test_bulk_verify_skips_unrankable_records() {
        let svc = service();
        let a = athlete("Esha", 20, Gender::Female);
        let o = official("Official Gill");
        svc.store.insert_user(&a).await.unwrap();
        svc.store.insert_user(&o).await.unwrap();

        let mut req = submission(a.id, RawMeasurements { strength_score: Some(40.0), ..Default::default() });
        req.test_type = TestType::StrengthTest;
        let id = svc.submit(req).await.unwrap().assessment.id;

        let bulk = |status| BulkVerification { official_id: o.id, assessment_ids: vec![id], status, notes: None };
        let out = svc.bulk_verify(bulk(VerificationStatus::Verified)).await.unwrap();
        assert!(out.modified.is_empty());
        assert_eq!(out.skipped.len(), 1);
        assert!(out.benchmarks.is_empty());
        assert_eq!(svc.assessment(id).await.unwrap().verification_status, VerificationStatus::Pending);

        let out = svc.bulk_verify(bulk(VerificationStatus::Rejected)).await.unwrap();
        assert_eq!(out.modified, vec![id]);
        assert!(out.benchmarks.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_verify_validation_and_roles() {
        let svc = service();
        let c = coach("Coach Rao");
        let o = official("Official Shah");
        svc.store.insert_user(&c).await.unwrap();
        svc.store.insert_user(&o).await.unwrap();

        let bulk = |official_id, ids: Vec<Uuid>, status| BulkVerification {
            official_id,
            assessment_ids: ids,
            status,
            notes: None,
        };
        let one = vec![Uuid::new_v4()];
        assert!(matches!(
            svc.bulk_verify(bulk(o.id, vec![], VerificationStatus::Verified)).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            svc.bulk_verify(bulk(o.id, one.clone(), VerificationStatus::Pending)).await,
            Err(ServiceError::Validation(_))
        ));
        let too_many = (0..=MAX_BULK_VERIFY).map(|_| Uuid::new_v4()).collect();
        assert!(matches!(
            svc.bulk_verify(bulk(o.id, too_many, VerificationStatus::Verified)).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            svc.bulk_verify(bulk(c.id, one, VerificationStatus::Verified)).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let svc = service();
        let a = athlete("Farah", 17, Gender::Female);
        svc.store.insert_user(&a).await.unwrap();

        let update = ProfileUpdate {
            name: Some("  Farah Ali ".into()),
            city: Some("Pune".into()),
            specialization: Some("Sprinting".into()),
            ..Default::default()
        };
        let user = svc.update_profile(a.id, update).await.unwrap();
        assert_eq!(user.name, "Farah Ali");
        assert_eq!(user.city, "Pune");
        assert_eq!(user.state, a.state);
        assert_eq!(user.specialization.as_deref(), Some("Sprinting"));
        assert_eq!(svc.user(a.id).await.unwrap().name, "Farah Ali");

        let short = ProfileUpdate { name: Some("F".into()), ..Default::default() };
        assert!(matches!(svc.update_profile(a.id, short).await, Err(ServiceError::Validation(_))));
        let long = ProfileUpdate { name: Some("x".repeat(101)), ..Default::default() };
        assert!(matches!(svc.update_profile(a.id, long).await, Err(ServiceError::Validation(_))));
        assert!(matches!(
            svc.update_profile(Uuid::new_v4(), ProfileUpdate::default()).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}

/// Core record types shared by the store, the scorer and the HTTP layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cohort::{AgeGroup, CohortKey};
use crate::error::ScoringError;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    VerticalJump,
    ShuttleRun,
    SitUps,
    #[serde(rename = "endurance_run_800m")]
    EnduranceRun800m,
    #[serde(rename = "endurance_run_1500m")]
    EnduranceRun1500m,
    HeightWeight,
    Flexibility,
    StrengthTest,
}

impl TestType {
    pub const ALL: [TestType; 8] = [
        TestType::VerticalJump,
        TestType::ShuttleRun,
        TestType::SitUps,
        TestType::EnduranceRun800m,
        TestType::EnduranceRun1500m,
        TestType::HeightWeight,
        TestType::Flexibility,
        TestType::StrengthTest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::VerticalJump => "vertical_jump",
            TestType::ShuttleRun => "shuttle_run",
            TestType::SitUps => "sit_ups",
            TestType::EnduranceRun800m => "endurance_run_800m",
            TestType::EnduranceRun1500m => "endurance_run_1500m",
            TestType::HeightWeight => "height_weight",
            TestType::Flexibility => "flexibility",
            TestType::StrengthTest => "strength_test",
        }
    }

    /// Human-readable name shown on dashboards.
    pub fn display_name(&self) -> &'static str {
        match self {
            TestType::VerticalJump => "Vertical Jump",
            TestType::ShuttleRun => "Shuttle Run",
            TestType::SitUps => "Sit-ups",
            TestType::EnduranceRun800m => "800m Endurance Run",
            TestType::EnduranceRun1500m => "1500m Endurance Run",
            TestType::HeightWeight => "Height & Weight",
            TestType::Flexibility => "Flexibility Test",
            TestType::StrengthTest => "Strength Test",
        }
    }

    /// Tests recorded on video need a video reference.
    pub fn requires_video(&self) -> bool {
        matches!(
            self,
            TestType::VerticalJump
                | TestType::ShuttleRun
                | TestType::SitUps
                | TestType::EnduranceRun800m
                | TestType::EnduranceRun1500m
        )
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ScoringError::InvalidInput(format!("unknown test type '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(ScoringError::InvalidInput(format!("unknown gender '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Athlete,
    Coach,
    Official,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Athlete => "athlete",
            UserRole::Coach => "coach",
            UserRole::Official => "official",
        }
    }
}

impl FromStr for UserRole {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "athlete" => Ok(UserRole::Athlete),
            "coach" => Ok(UserRole::Coach),
            "official" => Ok(UserRole::Official),
            _ => Err(ScoringError::InvalidInput(format!("unknown role '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Flagged,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Flagged => "flagged",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "verified" => Ok(VerificationStatus::Verified),
            "flagged" => Ok(VerificationStatus::Flagged),
            "rejected" => Ok(VerificationStatus::Rejected),
            _ => Err(ScoringError::InvalidInput(format!("unknown verification status '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub city: String,
    pub state: String,
    pub specialization: Option<String>,
    #[serde(default)]
    pub points: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, role: UserRole, date_of_birth: NaiveDate, gender: Gender) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email: email.to_lowercase(),
            role,
            date_of_birth,
            gender,
            city: String::new(),
            state: String::new(),
            specialization: None,
            points: 0,
            created_at: Utc::now(),
        }
    }

    /// Age in whole years on the given date.
    pub fn age_on(&self, on: NaiveDate) -> i64 {
        crate::cohort::age_on(self.date_of_birth, on)
    }

    pub fn location(&self) -> String {
        format!("{}, {}", self.city, self.state)
    }
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// Raw per-test measurements in their natural units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMeasurements {
    pub jump_height_cm: Option<f64>,
    pub shuttle_time_secs: Option<f64>,
    pub sit_up_count: Option<u32>,
    pub sit_up_duration_secs: Option<f64>,
    pub run_time_secs: Option<f64>,
    pub run_distance_m: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub flexibility_cm: Option<f64>,
    pub strength_score: Option<f64>,
}

impl RawMeasurements {
    pub fn is_empty(&self) -> bool {
        *self == RawMeasurements::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    FormIssue,
    TimingManipulation,
    VideoTampering,
    EnvironmentalFactor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub description: String,
    pub severity: Severity,
    /// Offset into the video, in seconds.
    pub timestamp_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub joint: String,
    pub accuracy: f64,
    pub feedback: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormAnalysis {
    pub overall_score: f64,
    #[serde(default)]
    pub key_points: Vec<KeyPoint>,
}

/// All three in [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub consistency: f64,
    pub technique: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    /// In [0, 1].
    pub confidence: f64,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    pub form: FormAnalysis,
    pub metrics: Option<PerformanceMetrics>,
}

/// Cohort summary statistics. All three are `None` when there were no peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkAggregate {
    pub test_type: TestType,
    pub age_group: AgeGroup,
    pub gender: Gender,
    pub average_score: Option<f64>,
    pub top_percentile_score: Option<f64>,
    pub bottom_percentile_score: Option<f64>,
}

impl BenchmarkAggregate {
    pub fn empty(key: CohortKey) -> Self {
        Self {
            test_type: key.test_type,
            age_group: key.age_group,
            gender: key.gender,
            average_score: None,
            top_percentile_score: None,
            bottom_percentile_score: None,
        }
    }

    pub fn cohort(&self) -> CohortKey {
        CohortKey::new(self.test_type, self.age_group, self.gender)
    }
}

/// Persisted per-cohort aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortBenchmark {
    pub aggregate: BenchmarkAggregate,
    pub sample_size: usize,
    pub updated_at: DateTime<Utc>,
}

impl CohortBenchmark {
    pub fn cohort(&self) -> CohortKey {
        self.aggregate.cohort()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestConditions {
    pub weather: Option<String>,
    pub temperature_c: Option<f64>,
    pub humidity: Option<f64>,
    pub location: Option<String>,
    pub equipment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    Feedback,
    ImprovementSuggestion,
    VerificationNote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub kind: CommentKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    PerformanceAnomaly,
    TechnicalIssue,
    RequiresReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub kind: FlagKind,
    pub description: String,
    pub flagged_by: Option<Uuid>,
    pub flagged_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: Uuid,
    pub athlete_id: Uuid,
    pub test_type: TestType,
    pub test_date: DateTime<Utc>,
    pub age_group: AgeGroup,
    pub gender: Gender,
    pub video_url: Option<String>,
    pub video_thumbnail: Option<String>,
    pub video_duration_secs: Option<f64>,
    #[serde(default)]
    pub raw_data: RawMeasurements,
    #[serde(default)]
    pub ai_analysis: AiAnalysis,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    pub verified_by: Option<Uuid>,
    pub verification_date: Option<DateTime<Utc>>,
    pub verification_notes: Option<String>,
    pub normalized_score: Option<f64>,
    pub percentile: Option<u8>,
    /// Snapshot of the cohort statistics the percentile was computed against.
    pub benchmark: Option<BenchmarkAggregate>,
    pub test_conditions: Option<TestConditions>,
    pub attempt_number: u32,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub flags: Vec<Flag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assessment {
    pub fn new(athlete_id: Uuid, test_type: TestType, age_group: AgeGroup, gender: Gender) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            athlete_id,
            test_type,
            test_date: now,
            age_group,
            gender,
            video_url: None,
            video_thumbnail: None,
            video_duration_secs: None,
            raw_data: RawMeasurements::default(),
            ai_analysis: AiAnalysis::default(),
            verification_status: VerificationStatus::Pending,
            verified_by: None,
            verification_date: None,
            verification_notes: None,
            normalized_score: None,
            percentile: None,
            benchmark: None,
            test_conditions: None,
            attempt_number: 1,
            comments: Vec::new(),
            flags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn cohort(&self) -> CohortKey {
        CohortKey::new(self.test_type, self.age_group, self.gender)
    }

    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_type_round_trips_through_text() {
        for t in TestType::ALL {
            assert_eq!(t.as_str().parse::<TestType>().unwrap(), t);
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
        assert!("long_jump".parse::<TestType>().is_err());
    }

    #[test]
    fn test_video_requirement() {
        assert!(TestType::ShuttleRun.requires_video());
        assert!(!TestType::HeightWeight.requires_video());
        assert_eq!(TestType::EnduranceRun800m.display_name(), "800m Endurance Run");
    }

    #[test]
    fn test_new_assessment_is_pending_and_unscored() {
        let a = Assessment::new(Uuid::new_v4(), TestType::SitUps, AgeGroup::From16To18, Gender::Male);
        assert_eq!(a.verification_status, VerificationStatus::Pending);
        assert!(a.normalized_score.is_none());
        assert!(a.percentile.is_none());
        assert_eq!(a.cohort().to_string(), "sit_ups:16-18:male");
    }

    #[test]
    fn test_user_email_lowercased() {
        let dob = NaiveDate::from_ymd_opt(2005, 3, 1).unwrap();
        let u = User::new("Asha".into(), "Asha@Example.COM".into(), UserRole::Athlete, dob, Gender::Female);
        assert_eq!(u.email, "asha@example.com");
        assert_eq!(u.age_on(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()), 18);
    }
}

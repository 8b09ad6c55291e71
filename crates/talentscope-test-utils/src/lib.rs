//! Shared fixtures for TalentScope tests.

use chrono::{Months, NaiveDate, Utc};
use talentscope_common::entities::{Assessment, User, UserRole, VerificationStatus};
use talentscope_common::{CohortKey, Gender};
use uuid::Uuid;

/// Date of birth that makes someone exactly `age` years old today.
pub fn born_years_ago(age: u32) -> NaiveDate {
    let today = Utc::now().date_naive();
    today.checked_sub_months(Months::new(age * 12)).unwrap_or(today)
}

fn user(name: &str, role: UserRole, age: u32, gender: Gender) -> User {
    let slug = name.to_lowercase().replace(' ', ".");
    let email = format!("{}.{}@example.com", slug, Uuid::new_v4().simple());
    let mut user = User::new(name.to_string(), email, role, born_years_ago(age), gender);
    user.city = "Pune".to_string();
    user.state = "Maharashtra".to_string();
    user
}

pub fn athlete(name: &str, age: u32, gender: Gender) -> User {
    user(name, UserRole::Athlete, age, gender)
}

pub fn coach(name: &str) -> User {
    let mut coach = user(name, UserRole::Coach, 35, Gender::Other);
    coach.specialization = Some("athletics".to_string());
    coach
}

pub fn official(name: &str) -> User {
    user(name, UserRole::Official, 40, Gender::Other)
}

/// An assessment in `cohort` carrying `score`, already in `status`.
pub fn scored_assessment(athlete_id: Uuid, cohort: CohortKey, score: f64, status: VerificationStatus) -> Assessment {
    let mut a = Assessment::new(athlete_id, cohort.test_type, cohort.age_group, cohort.gender);
    a.normalized_score = Some(score);
    a.verification_status = status;
    if status == VerificationStatus::Verified {
        a.verification_date = Some(Utc::now());
    }
    a
}

/// Verified scores for a cohort, one synthetic athlete each.
pub fn verified_cohort(cohort: CohortKey, scores: &[f64]) -> Vec<Assessment> {
    scores
        .iter()
        .map(|&s| scored_assessment(Uuid::new_v4(), cohort, s, VerificationStatus::Verified))
        .collect()
}

//! Cohort classification: age groups and the (test, age group, gender) key
//! that every percentile and benchmark is computed against.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::entities::{Gender, TestType};
use crate::error::ScoringError;

/// Age bracket used to group peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "12-15")]
    Under16,
    #[serde(rename = "16-18")]
    From16To18,
    #[serde(rename = "19-22")]
    From19To22,
    #[serde(rename = "23+")]
    Over22,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 4] = [
        AgeGroup::Under16,
        AgeGroup::From16To18,
        AgeGroup::From19To22,
        AgeGroup::Over22,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Under16 => "12-15",
            AgeGroup::From16To18 => "16-18",
            AgeGroup::From19To22 => "19-22",
            AgeGroup::Over22 => "23+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgeGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| ScoringError::InvalidInput(format!("unknown age group '{s}'")))
    }
}

/// Classify an age in whole years into its age group.
///
/// Every non-negative age maps to exactly one group; ages below 12 fall into
/// the youngest bracket.
pub fn classify(age_years: i64) -> Result<AgeGroup, ScoringError> {
    match age_years {
        a if a < 0 => Err(ScoringError::InvalidInput(format!(
            "age must be non-negative, got {a}"
        ))),
        a if a < 16 => Ok(AgeGroup::Under16),
        a if a < 19 => Ok(AgeGroup::From16To18),
        a if a < 23 => Ok(AgeGroup::From19To22),
        _ => Ok(AgeGroup::Over22),
    }
}

/// Whole years between `date_of_birth` and `on`, counting a birthday only once
/// it has been reached. Negative when `on` precedes the birth date.
pub fn age_on(date_of_birth: NaiveDate, on: NaiveDate) -> i64 {
    let mut age = i64::from(on.year() - date_of_birth.year());
    if (on.month(), on.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// Grouping key for peer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CohortKey {
    pub test_type: TestType,
    pub age_group: AgeGroup,
    pub gender: Gender,
}

impl CohortKey {
    pub fn new(test_type: TestType, age_group: AgeGroup, gender: Gender) -> Self {
        Self { test_type, age_group, gender }
    }

    /// Build the key for a performer of the given age.
    pub fn for_age(test_type: TestType, age_years: i64, gender: Gender) -> Result<Self, ScoringError> {
        Ok(Self::new(test_type, classify(age_years)?, gender))
    }
}

impl fmt::Display for CohortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.test_type.as_str(), self.age_group, self.gender.as_str())
    }
}

impl FromStr for CohortKey {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(t), Some(a), Some(g)) => Ok(Self::new(t.parse()?, a.parse()?, g.parse()?)),
            _ => Err(ScoringError::InvalidInput(format!("malformed cohort key '{s}'"))),
        }
    }
}

//! Static catalogue of supported tests: categories, units and how to perform them.

use serde::{Deserialize, Serialize};
use talentscope_common::TestType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    Athletics,
    Fitness,
}

impl TestCategory {
    pub const ALL: [TestCategory; 2] = [TestCategory::Athletics, TestCategory::Fitness];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestCategory::Athletics => "athletics",
            TestCategory::Fitness => "fitness",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryInfo {
    pub id: TestCategory,
    pub name: &'static str,
    pub description: &'static str,
    pub tests: Vec<TestType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestInfo {
    pub id: TestType,
    pub name: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
    pub category: TestCategory,
    pub requires_video: bool,
    pub instructions: &'static [&'static str],
}

pub fn categories() -> Vec<CategoryInfo> {
    TestCategory::ALL
        .into_iter()
        .map(|category| {
            let (name, description) = match category {
                TestCategory::Athletics => ("Athletics", "Track and field events"),
                TestCategory::Fitness => ("General Fitness", "Basic fitness assessments"),
            };
            CategoryInfo {
                id: category,
                name,
                description,
                tests: TestType::ALL.into_iter().filter(|t| category_of(*t) == category).collect(),
            }
        })
        .collect()
}

/// Every test, or only those in `category`, in catalogue order.
pub fn tests(category: Option<TestCategory>) -> Vec<TestInfo> {
    TestType::ALL
        .into_iter()
        .map(test_info)
        .filter(|t| category.is_none_or(|c| t.category == c))
        .collect()
}

pub fn category_of(test_type: TestType) -> TestCategory {
    match test_type {
        TestType::VerticalJump | TestType::ShuttleRun | TestType::EnduranceRun800m | TestType::EnduranceRun1500m => {
            TestCategory::Athletics
        }
        TestType::SitUps | TestType::Flexibility | TestType::StrengthTest | TestType::HeightWeight => {
            TestCategory::Fitness
        }
    }
}

pub fn test_info(test_type: TestType) -> TestInfo {
    let (description, unit, instructions): (&str, &str, &[&str]) = match test_type {
        TestType::VerticalJump => (
            "Measures explosive leg power",
            "cm",
            &[
                "Stand with feet shoulder-width apart",
                "Jump as high as possible",
                "Land softly on both feet",
                "Perform 3 attempts",
            ],
        ),
        TestType::ShuttleRun => (
            "Tests agility and speed",
            "seconds",
            &[
                "Set up cones 10 meters apart",
                "Run back and forth between cones",
                "Touch each cone before turning",
                "Complete 5 round trips",
            ],
        ),
        TestType::SitUps => (
            "Measures core strength and endurance",
            "repetitions",
            &[
                "Lie on back with knees bent",
                "Hands behind head or crossed on chest",
                "Lift shoulders off ground",
                "Perform for 60 seconds",
            ],
        ),
        TestType::EnduranceRun800m => (
            "Tests cardiovascular endurance",
            "seconds",
            &[
                "Run 800 meters at steady pace",
                "Maintain consistent speed",
                "Record total time",
                "Cool down with walking",
            ],
        ),
        TestType::EnduranceRun1500m => (
            "Tests long-distance endurance",
            "seconds",
            &[
                "Run 1500 meters at steady pace",
                "Pace yourself for distance",
                "Record total time",
                "Cool down properly",
            ],
        ),
        TestType::Flexibility => (
            "Measures range of motion",
            "cm",
            &[
                "Sit with legs extended",
                "Reach forward as far as possible",
                "Hold position for 2 seconds",
                "Measure reach distance",
            ],
        ),
        TestType::StrengthTest => (
            "Tests upper body strength",
            "repetitions",
            &[
                "Perform push-ups with proper form",
                "Lower chest to ground",
                "Push up to full extension",
                "Count maximum repetitions",
            ],
        ),
        TestType::HeightWeight => (
            "Basic anthropometric measurements",
            "cm/kg",
            &[
                "Measure height without shoes",
                "Weigh in light clothing",
                "Record both measurements",
                "Calculate BMI if needed",
            ],
        ),
    };

    TestInfo {
        id: test_type,
        name: test_type.display_name(),
        description,
        unit,
        category: category_of(test_type),
        requires_video: test_type.requires_video(),
        instructions,
    }
}

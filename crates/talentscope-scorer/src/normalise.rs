//! Raw measurement to 0-100 score mapping.
//!
//! Each test has its own linear scale anchored on a reference result.
//! Anthropometric, flexibility and strength tests have no mapping yet and
//! never receive a normalized score.

use talentscope_common::entities::RawMeasurements;
use talentscope_common::TestType;

/// Jump height that earns a full score.
const JUMP_FULL_CM: f64 = 80.0;
/// Shuttle time at which the score starts falling, and points lost per extra second.
const SHUTTLE_BASE_SECS: f64 = 10.0;
const SHUTTLE_PENALTY_PER_SEC: f64 = 20.0;
/// Sit-ups per minute that earn a full score.
const SIT_UPS_FULL: f64 = 50.0;
/// Run time at which the score starts falling; every 120 s beyond costs 50 points.
const RUN_BASE_SECS: f64 = 180.0;
const RUN_PENALTY_WINDOW_SECS: f64 = 120.0;

/// Normalized 0-100 score for `raw`, or `None` when the test has no scale
/// or the measurement it needs is absent.
pub fn normalise(test_type: TestType, raw: &RawMeasurements) -> Option<f64> {
    let score = match test_type {
        TestType::VerticalJump => raw.jump_height_cm? / JUMP_FULL_CM * 100.0,
        TestType::ShuttleRun => 100.0 - (raw.shuttle_time_secs? - SHUTTLE_BASE_SECS) * SHUTTLE_PENALTY_PER_SEC,
        TestType::SitUps => raw.sit_up_count? as f64 / SIT_UPS_FULL * 100.0,
        TestType::EnduranceRun800m | TestType::EnduranceRun1500m => {
            100.0 - (raw.run_time_secs? - RUN_BASE_SECS) / RUN_PENALTY_WINDOW_SECS * 50.0
        }
        TestType::HeightWeight | TestType::Flexibility | TestType::StrengthTest => return None,
    };
    score.is_finite().then(|| clamp_score(score))
}

pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_vertical_jump() {
        let raw = RawMeasurements { jump_height_cm: Some(60.0), ..Default::default() };
        assert!(approx(normalise(TestType::VerticalJump, &raw), 75.0));
        let raw = RawMeasurements { jump_height_cm: Some(95.0), ..Default::default() };
        assert!(approx(normalise(TestType::VerticalJump, &raw), 100.0));
    }

    #[test]
    fn test_shuttle_run() {
        let raw = RawMeasurements { shuttle_time_secs: Some(12.5), ..Default::default() };
        assert!(approx(normalise(TestType::ShuttleRun, &raw), 50.0));
        let raw = RawMeasurements { shuttle_time_secs: Some(16.0), ..Default::default() };
        assert!(approx(normalise(TestType::ShuttleRun, &raw), 0.0));
    }

    #[test]
    fn test_sit_ups() {
        let raw = RawMeasurements { sit_up_count: Some(35), ..Default::default() };
        assert!(approx(normalise(TestType::SitUps, &raw), 70.0));
    }

    #[test]
    fn test_endurance_runs_share_a_scale() {
        let raw = RawMeasurements { run_time_secs: Some(240.0), ..Default::default() };
        assert!(approx(normalise(TestType::EnduranceRun800m, &raw), 75.0));
        assert!(approx(normalise(TestType::EnduranceRun1500m, &raw), 75.0));
    }

    #[test]
    fn test_unmapped_tests_and_missing_data() {
        let raw = RawMeasurements { height_cm: Some(170.0), weight_kg: Some(60.0), ..Default::default() };
        assert_eq!(normalise(TestType::HeightWeight, &raw), None);
        assert_eq!(normalise(TestType::Flexibility, &raw), None);
        assert_eq!(normalise(TestType::VerticalJump, &RawMeasurements::default()), None);
    }
}

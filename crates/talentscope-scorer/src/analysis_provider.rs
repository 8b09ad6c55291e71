//! Trait for video analysis.
//!
//! Abstracts the computer-vision step that inspects a submitted test video,
//! so the assessment workflow does not depend on a particular model.
//!
//! No real model ships yet. [`SimulatedAnalysisProvider`] is a stub that
//! draws plausible values at random; [`FixedAnalysisProvider`] returns
//! configured values for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use talentscope_common::entities::{AiAnalysis, FormAnalysis, PerformanceMetrics, RawMeasurements};
use talentscope_common::TestType;

/// What the analysis step produced for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub analysis: AiAnalysis,
    /// Measurements read from the video, or the submitted ones when present.
    pub raw: RawMeasurements,
}

pub trait AnalysisProvider: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Analyse one submission.
    ///
    /// `submitted` holds measurements the athlete entered by hand; a
    /// provider must keep them rather than overwrite them.
    fn analyse(&self, test_type: TestType, submitted: &RawMeasurements) -> AnalysisReport;
}

// ── Simulated stub ─────────────────────────────────────────────────────────

/// Stub provider producing random but plausible analysis output.
pub struct SimulatedAnalysisProvider {
    rng: Mutex<StdRng>,
}

impl SimulatedAnalysisProvider {
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    /// Deterministic output for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    fn simulate_raw(rng: &mut StdRng, test_type: TestType) -> RawMeasurements {
        let mut raw = RawMeasurements::default();
        match test_type {
            TestType::VerticalJump => raw.jump_height_cm = Some(rng.gen_range(40..80) as f64),
            TestType::ShuttleRun => raw.shuttle_time_secs = Some(rng.gen_range(10.0..15.0)),
            TestType::SitUps => {
                raw.sit_up_count = Some(rng.gen_range(20..50));
                raw.sit_up_duration_secs = Some(60.0);
            }
            TestType::EnduranceRun800m | TestType::EnduranceRun1500m => {
                raw.run_time_secs = Some(rng.gen_range(180.0..300.0));
                raw.run_distance_m = Some(if test_type == TestType::EnduranceRun800m { 800.0 } else { 1500.0 });
            }
            TestType::HeightWeight | TestType::Flexibility | TestType::StrengthTest => {}
        }
        raw
    }
}

impl Default for SimulatedAnalysisProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisProvider for SimulatedAnalysisProvider {
    fn name(&self) -> &str {
        "simulated"
    }

    fn analyse(&self, test_type: TestType, submitted: &RawMeasurements) -> AnalysisReport {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let analysis = AiAnalysis {
            confidence: rng.gen_range(0.7..1.0),
            anomalies: Vec::new(),
            form: FormAnalysis {
                overall_score: rng.gen_range(70..100) as f64,
                key_points: Vec::new(),
            },
            metrics: Some(PerformanceMetrics {
                consistency: rng.gen_range(70..100) as f64,
                technique: rng.gen_range(70..100) as f64,
                efficiency: rng.gen_range(70..100) as f64,
            }),
        };

        let raw = if submitted.is_empty() {
            Self::simulate_raw(&mut rng, test_type)
        } else {
            submitted.clone()
        };

        AnalysisReport { analysis, raw }
    }
}

// ── Fixed implementation for testing ───────────────────────────────────────

/// Provider with hardcoded output.
#[derive(Default)]
pub struct FixedAnalysisProvider {
    analysis: AiAnalysis,
    raw: HashMap<TestType, RawMeasurements>,
}

impl FixedAnalysisProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: PerformanceMetrics) -> Self {
        self.analysis.metrics = Some(metrics);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.analysis.confidence = confidence;
        self
    }

    /// Measurements reported when a submission of `test_type` carries none.
    pub fn with_raw(mut self, test_type: TestType, raw: RawMeasurements) -> Self {
        self.raw.insert(test_type, raw);
        self
    }
}

impl AnalysisProvider for FixedAnalysisProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    fn analyse(&self, test_type: TestType, submitted: &RawMeasurements) -> AnalysisReport {
        let raw = if submitted.is_empty() {
            self.raw.get(&test_type).cloned().unwrap_or_default()
        } else {
            submitted.clone()
        };
        AnalysisReport { analysis: self.analysis.clone(), raw }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_ranges() {
        let provider = SimulatedAnalysisProvider::seeded(7);
        for _ in 0..50 {
            let report = provider.analyse(TestType::SitUps, &RawMeasurements::default());
            assert!((0.7..1.0).contains(&report.analysis.confidence));
            let m = report.analysis.metrics.unwrap();
            for v in [m.consistency, m.technique, m.efficiency, report.analysis.form.overall_score] {
                assert!((70.0..100.0).contains(&v));
            }
            let count = report.raw.sit_up_count.unwrap();
            assert!((20..50).contains(&count));
            assert_eq!(report.raw.sit_up_duration_secs, Some(60.0));
        }
    }

    #[test]
    fn test_simulated_run_distance() {
        let provider = SimulatedAnalysisProvider::seeded(1);
        let report = provider.analyse(TestType::EnduranceRun1500m, &RawMeasurements::default());
        assert_eq!(report.raw.run_distance_m, Some(1500.0));
        let t = report.raw.run_time_secs.unwrap();
        assert!((180.0..300.0).contains(&t));
    }

    #[test]
    fn test_seed_is_deterministic() {
        let a = SimulatedAnalysisProvider::seeded(42).analyse(TestType::VerticalJump, &RawMeasurements::default());
        let b = SimulatedAnalysisProvider::seeded(42).analyse(TestType::VerticalJump, &RawMeasurements::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_submitted_measurements_kept() {
        let submitted = RawMeasurements { jump_height_cm: Some(71.0), ..Default::default() };
        let report = SimulatedAnalysisProvider::seeded(3).analyse(TestType::VerticalJump, &submitted);
        assert_eq!(report.raw, submitted);
    }

    #[test]
    fn test_fixed_provider() {
        let raw = RawMeasurements { shuttle_time_secs: Some(11.0), ..Default::default() };
        let provider = FixedAnalysisProvider::new()
            .with_confidence(0.9)
            .with_raw(TestType::ShuttleRun, raw.clone());

        let report = provider.analyse(TestType::ShuttleRun, &RawMeasurements::default());
        assert_eq!(report.raw, raw);
        assert_eq!(report.analysis.confidence, 0.9);
        assert!(provider.analyse(TestType::SitUps, &RawMeasurements::default()).raw.is_empty());
    }
}

//! Improvement suggestions derived from analysis metrics.

use serde::{Deserialize, Serialize};
use talentscope_common::entities::PerformanceMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub area: String,
    pub priority: Priority,
    pub suggestion: String,
}

impl Suggestion {
    fn new(area: &str, priority: Priority, suggestion: &str) -> Self {
        Self { area: area.to_string(), priority, suggestion: suggestion.to_string() }
    }
}

const TECHNIQUE_THRESHOLD: f64 = 70.0;
const CONSISTENCY_THRESHOLD: f64 = 60.0;
const EFFICIENCY_THRESHOLD: f64 = 65.0;

/// Suggestions for every metric below its threshold, technique first.
pub fn improvement_suggestions(metrics: Option<&PerformanceMetrics>) -> Vec<Suggestion> {
    let Some(m) = metrics else {
        return Vec::new();
    };

    let mut out = Vec::new();
    if m.technique < TECHNIQUE_THRESHOLD {
        out.push(Suggestion::new(
            "Technique",
            Priority::High,
            "Focus on proper form and technique. Consider working with a coach to improve movement patterns.",
        ));
    }
    if m.consistency < CONSISTENCY_THRESHOLD {
        out.push(Suggestion::new(
            "Consistency",
            Priority::Medium,
            "Work on maintaining consistent performance across multiple attempts. Practice regularly to build muscle memory.",
        ));
    }
    if m.efficiency < EFFICIENCY_THRESHOLD {
        out.push(Suggestion::new(
            "Efficiency",
            Priority::Medium,
            "Focus on energy conservation and optimal movement patterns to improve efficiency.",
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_weak_metrics() {
        let m = PerformanceMetrics { consistency: 50.0, technique: 60.0, efficiency: 60.0 };
        let areas: Vec<_> = improvement_suggestions(Some(&m)).into_iter().map(|s| (s.area, s.priority)).collect();
        assert_eq!(
            areas,
            vec![
                ("Technique".to_string(), Priority::High),
                ("Consistency".to_string(), Priority::Medium),
                ("Efficiency".to_string(), Priority::Medium),
            ]
        );
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let m = PerformanceMetrics { consistency: 60.0, technique: 70.0, efficiency: 65.0 };
        assert!(improvement_suggestions(Some(&m)).is_empty());
    }

    #[test]
    fn test_no_metrics_no_suggestions() {
        assert!(improvement_suggestions(None).is_empty());
    }
}

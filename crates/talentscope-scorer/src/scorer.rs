//! Cohort percentile scoring.
//!
//! Ranks one normalized score against the verified scores of its cohort and
//! summarises that cohort (mean, 90th and 10th percentile markers).
//!
//! The computation is pure: the caller fetches peers and persists results.

use serde::{Deserialize, Serialize};
use talentscope_common::entities::{Assessment, BenchmarkAggregate};
use talentscope_common::{CohortKey, ScoringError};

/// Percentile given to a score that has no verified peers to rank against.
pub const DEFAULT_PERCENTILE: u8 = 50;

const TOP_FRACTION: f64 = 0.9;
const BOTTOM_FRACTION: f64 = 0.1;

/// The score being ranked and the cohort it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreInput {
    pub normalized_score: Option<f64>,
    pub cohort: CohortKey,
}

impl ScoreInput {
    pub fn new(normalized_score: Option<f64>, cohort: CohortKey) -> Self {
        Self { normalized_score, cohort }
    }
}

impl From<&Assessment> for ScoreInput {
    fn from(a: &Assessment) -> Self {
        Self::new(a.normalized_score, a.cohort())
    }
}

/// Rank `input` against `cohort_scores` and summarise the peers.
///
/// `cohort_scores` are the previously verified scores of the cohort and must
/// not contain the score being ranked. Ties are not counted as beaten.
///
/// With no peers the percentile is [`DEFAULT_PERCENTILE`] and every
/// benchmark statistic is `None`.
pub fn score_and_benchmark(
    input: &ScoreInput,
    cohort_scores: &[f64],
) -> Result<(u8, BenchmarkAggregate), ScoringError> {
    let score = input
        .normalized_score
        .filter(|s| s.is_finite())
        .ok_or(ScoringError::MissingScore)?;

    let sorted = sorted_peers(cohort_scores)?;
    if sorted.is_empty() {
        return Ok((DEFAULT_PERCENTILE, BenchmarkAggregate::empty(input.cohort)));
    }

    let rank = sorted.partition_point(|&peer| peer < score);
    let percentile = percentile_of(rank, sorted.len());

    Ok((percentile, aggregate_sorted(input.cohort, &sorted)))
}

/// Summary statistics for a full set of cohort scores.
///
/// Used for the persisted cohort aggregate, which covers every verified
/// score in the cohort.
pub fn benchmark_for(cohort: CohortKey, scores: &[f64]) -> Result<BenchmarkAggregate, ScoringError> {
    let sorted = sorted_peers(scores)?;
    if sorted.is_empty() {
        return Ok(BenchmarkAggregate::empty(cohort));
    }
    Ok(aggregate_sorted(cohort, &sorted))
}

/// `round(rank / len * 100)` with halves rounded up, in integer arithmetic.
fn percentile_of(rank: usize, len: usize) -> u8 {
    debug_assert!(len > 0 && rank <= len);
    let (rank, len) = (rank as u64, len as u64);
    ((200 * rank + len) / (2 * len)) as u8
}

fn sorted_peers(scores: &[f64]) -> Result<Vec<f64>, ScoringError> {
    if let Some(bad) = scores.iter().find(|s| !s.is_finite() || **s < 0.0) {
        return Err(ScoringError::InvalidPeerData(format!(
            "cohort contains invalid score {bad}"
        )));
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

/// `sorted` must be ascending and non-empty.
fn aggregate_sorted(cohort: CohortKey, sorted: &[f64]) -> BenchmarkAggregate {
    let len = sorted.len();
    let at = |fraction: f64| sorted[((len as f64 * fraction).floor() as usize).min(len - 1)];

    BenchmarkAggregate {
        average_score: Some(sorted.iter().sum::<f64>() / len as f64),
        top_percentile_score: Some(at(TOP_FRACTION)),
        bottom_percentile_score: Some(at(BOTTOM_FRACTION)),
        ..BenchmarkAggregate::empty(cohort)
    }
}

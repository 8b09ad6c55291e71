//! Arrow record batch conversion for LanceDB.

use crate::error::{DbError, Result};
use crate::schema::{assessment_schema, benchmark_schema, user_schema};
use arrow_array::{Array, Float64Array, Int64Array, RecordBatch, StringArray};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use talentscope_common::entities::{Assessment, BenchmarkAggregate, CohortBenchmark, User};

// =============================================================================
// Column access
// =============================================================================

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DbError::Arrow(format!("missing column '{name}'")))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| DbError::Arrow(format!("column '{name}' has unexpected type")))
}

fn get_string(batch: &RecordBatch, name: &str, row: usize) -> Result<String> {
    Ok(column::<StringArray>(batch, name)?.value(row).to_string())
}

fn get_opt_f64(batch: &RecordBatch, name: &str, row: usize) -> Result<Option<f64>> {
    let arr = column::<Float64Array>(batch, name)?;
    Ok(if arr.is_null(row) { None } else { Some(arr.value(row)) })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::InvalidRecord(format!("bad timestamp '{raw}': {e}")))
}

// =============================================================================
// User
// =============================================================================

pub fn user_to_record(user: &User) -> Result<RecordBatch> {
    let document = serde_json::to_string(user)?;

    RecordBatch::try_new(
        user_schema(),
        vec![
            Arc::new(StringArray::from(vec![user.id.to_string()])) as Arc<dyn Array>,
            Arc::new(StringArray::from(vec![user.email.as_str()])),
            Arc::new(StringArray::from(vec![user.role.as_str()])),
            Arc::new(StringArray::from(vec![document])),
        ],
    )
    .map_err(|e| DbError::Arrow(e.to_string()))
}

pub fn record_to_user(batch: &RecordBatch, row: usize) -> Result<User> {
    let document = get_string(batch, "document", row)?;
    Ok(serde_json::from_str(&document)?)
}

// =============================================================================
// Assessment
// =============================================================================

pub fn assessment_to_record(assessment: &Assessment) -> Result<RecordBatch> {
    let document = serde_json::to_string(assessment)?;

    RecordBatch::try_new(
        assessment_schema(),
        vec![
            Arc::new(StringArray::from(vec![assessment.id.to_string()])) as Arc<dyn Array>,
            Arc::new(StringArray::from(vec![assessment.athlete_id.to_string()])),
            Arc::new(StringArray::from(vec![assessment.test_type.as_str()])),
            Arc::new(StringArray::from(vec![assessment.age_group.as_str()])),
            Arc::new(StringArray::from(vec![assessment.gender.as_str()])),
            Arc::new(StringArray::from(vec![assessment.verification_status.as_str()])),
            Arc::new(Float64Array::from(vec![assessment.normalized_score])),
            Arc::new(StringArray::from(vec![assessment.test_date.to_rfc3339()])),
            Arc::new(StringArray::from(vec![document])),
        ],
    )
    .map_err(|e| DbError::Arrow(e.to_string()))
}

pub fn record_to_assessment(batch: &RecordBatch, row: usize) -> Result<Assessment> {
    let document = get_string(batch, "document", row)?;
    Ok(serde_json::from_str(&document)?)
}

/// Read the `normalized_score` column of a projected batch, skipping nulls.
pub fn scores_from_batch(batch: &RecordBatch) -> Result<Vec<f64>> {
    let arr = column::<Float64Array>(batch, "normalized_score")?;
    Ok((0..arr.len())
        .filter(|&i| !arr.is_null(i))
        .map(|i| arr.value(i))
        .collect())
}

// =============================================================================
// Cohort benchmark
// =============================================================================

pub fn benchmark_to_record(benchmark: &CohortBenchmark) -> Result<RecordBatch> {
    let agg = &benchmark.aggregate;

    RecordBatch::try_new(
        benchmark_schema(),
        vec![
            Arc::new(StringArray::from(vec![benchmark.cohort().to_string()])) as Arc<dyn Array>,
            Arc::new(StringArray::from(vec![agg.test_type.as_str()])),
            Arc::new(StringArray::from(vec![agg.age_group.as_str()])),
            Arc::new(StringArray::from(vec![agg.gender.as_str()])),
            Arc::new(Float64Array::from(vec![agg.average_score])),
            Arc::new(Float64Array::from(vec![agg.top_percentile_score])),
            Arc::new(Float64Array::from(vec![agg.bottom_percentile_score])),
            Arc::new(Int64Array::from(vec![benchmark.sample_size as i64])),
            Arc::new(StringArray::from(vec![benchmark.updated_at.to_rfc3339()])),
        ],
    )
    .map_err(|e| DbError::Arrow(e.to_string()))
}

pub fn record_to_benchmark(batch: &RecordBatch, row: usize) -> Result<CohortBenchmark> {
    let invalid = |e: talentscope_common::ScoringError| DbError::InvalidRecord(e.to_string());

    let aggregate = BenchmarkAggregate {
        test_type: get_string(batch, "test_type", row)?.parse().map_err(invalid)?,
        age_group: get_string(batch, "age_group", row)?.parse().map_err(invalid)?,
        gender: get_string(batch, "gender", row)?.parse().map_err(invalid)?,
        average_score: get_opt_f64(batch, "average_score", row)?,
        top_percentile_score: get_opt_f64(batch, "top_percentile_score", row)?,
        bottom_percentile_score: get_opt_f64(batch, "bottom_percentile_score", row)?,
    };
    let sample_size = column::<Int64Array>(batch, "sample_size")?.value(row);

    Ok(CohortBenchmark {
        aggregate,
        sample_size: usize::try_from(sample_size)
            .map_err(|_| DbError::InvalidRecord(format!("negative sample size {sample_size}")))?,
        updated_at: parse_timestamp(&get_string(batch, "updated_at", row)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use talentscope_common::{AgeGroup, CohortKey, Gender, TestType};

    #[test]
    fn test_benchmark_record_keeps_missing_statistics_null() {
        let key = CohortKey::new(TestType::ShuttleRun, AgeGroup::Over22, Gender::Other);
        let benchmark = CohortBenchmark {
            aggregate: BenchmarkAggregate::empty(key),
            sample_size: 0,
            updated_at: Utc::now(),
        };
        let batch = benchmark_to_record(&benchmark).unwrap();
        let back = record_to_benchmark(&batch, 0).unwrap();
        assert_eq!(back.aggregate, benchmark.aggregate);
        assert_eq!(back.cohort(), key);
    }

    #[test]
    fn test_scores_skip_nulls() {
        let mut a = Assessment::new(uuid::Uuid::new_v4(), TestType::SitUps, AgeGroup::Under16, Gender::Male);
        let unscored = assessment_to_record(&a).unwrap();
        assert!(scores_from_batch(&unscored).unwrap().is_empty());

        a.normalized_score = Some(64.0);
        let scored = assessment_to_record(&a).unwrap();
        assert_eq!(scores_from_batch(&scored).unwrap(), vec![64.0]);
    }
}

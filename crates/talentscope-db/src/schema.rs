//! Table names and Arrow schemas for the LanceDB tables.
//!
//! Columns that queries filter on are stored natively; the full record is
//! kept as a JSON `document` column so nested fields (analysis, comments,
//! flags) survive without a wide schema.

use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const TABLE_USERS: &str = "users";
pub const TABLE_ASSESSMENTS: &str = "assessments";
pub const TABLE_BENCHMARKS: &str = "cohort_benchmarks";

pub fn user_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("email", DataType::Utf8, false),
        Field::new("role", DataType::Utf8, false),
        Field::new("document", DataType::Utf8, false),
    ]))
}

pub fn assessment_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("athlete_id", DataType::Utf8, false),
        Field::new("test_type", DataType::Utf8, false),
        Field::new("age_group", DataType::Utf8, false),
        Field::new("gender", DataType::Utf8, false),
        Field::new("verification_status", DataType::Utf8, false),
        Field::new("normalized_score", DataType::Float64, true),
        Field::new("test_date", DataType::Utf8, false),
        Field::new("document", DataType::Utf8, false),
    ]))
}

pub fn benchmark_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("cohort_key", DataType::Utf8, false),
        Field::new("test_type", DataType::Utf8, false),
        Field::new("age_group", DataType::Utf8, false),
        Field::new("gender", DataType::Utf8, false),
        Field::new("average_score", DataType::Float64, true),
        Field::new("top_percentile_score", DataType::Float64, true),
        Field::new("bottom_percentile_score", DataType::Float64, true),
        Field::new("sample_size", DataType::Int64, false),
        Field::new("updated_at", DataType::Utf8, false),
    ]))
}

//! Cohort benchmark lookup.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use talentscope_common::{ApiError, CohortKey, ScoringError};

use crate::state::SharedState;

/// GET /api/benchmarks/{test_type}/{age_group}/{gender}
pub async fn get_benchmark(
    State(state): State<SharedState>,
    Path((test_type, age_group, gender)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let bad_request = |e: ScoringError| ApiError::BadRequest(e.to_string());
    let cohort = CohortKey::new(
        test_type.parse().map_err(bad_request)?,
        age_group.parse().map_err(bad_request)?,
        gender.parse().map_err(bad_request)?,
    );

    let benchmark = state.service.benchmark(cohort).await?;
    Ok(Json(json!({ "success": true, "benchmark": benchmark })))
}

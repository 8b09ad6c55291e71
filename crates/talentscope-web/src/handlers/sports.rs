//! Test catalogue: categories, units and instructions.

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use talentscope_common::{ApiError, ScoringError, TestType};
use talentscope_scorer::{catalogue, TestCategory};

#[derive(Debug, Deserialize)]
pub struct TestsParams {
    pub category: Option<TestCategory>,
}

/// GET /api/sports/categories
pub async fn categories() -> impl IntoResponse {
    Json(json!({ "success": true, "categories": catalogue::categories() }))
}

/// GET /api/sports/tests?category=
pub async fn tests(Query(params): Query<TestsParams>) -> impl IntoResponse {
    Json(json!({ "success": true, "tests": catalogue::tests(params.category) }))
}

/// GET /api/sports/tests/{test_type}
pub async fn test_details(Path(test_type): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let test_type: TestType = test_type
        .parse()
        .map_err(|_: ScoringError| ApiError::NotFound("Test not found".into()))?;
    Ok(Json(json!({ "success": true, "test": catalogue::test_info(test_type) })))
}

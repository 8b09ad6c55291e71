//! Per-test leaderboards.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use talentscope_common::{ApiError, TestType};

use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize { 10 }

/// GET /api/leaderboard/{test_type}?limit=
pub async fn leaderboard(
    State(state): State<SharedState>,
    Path(test_type): Path<String>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, ApiError> {
    let test_type: TestType = test_type
        .parse()
        .map_err(|e: talentscope_common::ScoringError| ApiError::BadRequest(e.to_string()))?;

    let entries = state.service.leaderboard(test_type, params.limit).await?;
    Ok(Json(json!({
        "success": true,
        "test_type": test_type,
        "display_name": test_type.display_name(),
        "leaderboard": entries,
    })))
}

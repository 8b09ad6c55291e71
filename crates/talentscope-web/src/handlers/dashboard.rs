//! Role dashboards, the review queue and the athlete listing.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use talentscope_common::{ApiError, TestType};
use talentscope_scorer::{BulkVerification, UserFilter};
use uuid::Uuid;

use crate::state::{AppEvent, SharedState};

#[derive(Debug, Deserialize)]
pub struct PendingParams {
    pub official_id: Uuid,
    pub test_type: Option<TestType>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct AthleteParams {
    pub viewer_id: Uuid,
    pub search: Option<String>,
    pub state: Option<String>,
    pub sport: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize { 1 }
fn default_limit() -> usize { 20 }

/// GET /api/dashboard/{user_id}
pub async fn dashboard_stats(
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.service.dashboard(user_id).await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// GET /api/dashboard/pending-assessments?official_id=&test_type=&page=&limit=
pub async fn pending_assessments(
    State(state): State<SharedState>,
    Query(params): Query<PendingParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .service
        .pending_assessments(params.official_id, params.test_type, params.page, params.limit)
        .await?;
    Ok(Json(json!({
        "success": true,
        "assessments": page.items,
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "total": page.total,
            "pages": page.pages,
        },
    })))
}

/// POST /api/dashboard/bulk-verify
pub async fn bulk_verify(
    State(state): State<SharedState>,
    Json(req): Json<BulkVerification>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.service.bulk_verify(req).await?;
    let status = outcome.status.as_str();

    for id in &outcome.modified {
        state.publish(AppEvent::AssessmentVerified { assessment_id: *id, status: status.to_string() });
    }
    for bench in &outcome.benchmarks {
        state.publish(AppEvent::BenchmarkUpdated {
            cohort: bench.cohort().to_string(),
            sample_size: bench.sample_size,
            average_score: bench.aggregate.average_score,
        });
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("{} assessments {status} successfully", outcome.modified_count()),
        "modified_count": outcome.modified_count(),
        "modified": outcome.modified,
        "skipped": outcome.skipped,
        "benchmarks": outcome.benchmarks,
    })))
}

/// GET /api/dashboard/athletes?viewer_id=&search=&state=&sport=&page=&limit=
pub async fn athletes(
    State(state): State<SharedState>,
    Query(params): Query<AthleteParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = UserFilter { search: params.search, role: None, state: params.state, sport: params.sport };
    let page = state
        .service
        .athletes(params.viewer_id, &filter, params.page, params.limit)
        .await?;
    Ok(Json(json!({
        "success": true,
        "athletes": page.items,
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "total": page.total,
            "pages": page.pages,
        },
    })))
}

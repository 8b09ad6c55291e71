//! Assessment submission, review and history.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use talentscope_common::ApiError;
use talentscope_scorer::{NewAssessment, NewComment, Verification};
use uuid::Uuid;

use crate::state::{AppEvent, SharedState};

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize { 1 }
fn default_limit() -> usize { 10 }

/// POST /api/assessments
pub async fn submit_assessment(
    State(state): State<SharedState>,
    Json(req): Json<NewAssessment>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.service.submit(req).await?;
    let a = &outcome.assessment;

    state.publish(AppEvent::AssessmentSubmitted {
        assessment_id: a.id,
        athlete_id: a.athlete_id,
        test_type: a.test_type.as_str().to_string(),
        normalized_score: a.normalized_score,
        percentile: a.percentile,
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Assessment uploaded and analyzed successfully",
            "assessment": outcome.assessment,
            "points_awarded": outcome.points_awarded,
        })),
    ))
}

/// GET /api/assessments/{id}
pub async fn get_assessment(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let assessment = state.service.assessment(id).await?;
    Ok(Json(json!({
        "success": true,
        "display_name": assessment.test_type.display_name(),
        "assessment": assessment,
    })))
}

/// PUT /api/assessments/{id}/verify
pub async fn verify_assessment(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<Verification>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.service.verify(id, req).await?;
    let status = outcome.assessment.verification_status.as_str();

    state.publish(AppEvent::AssessmentVerified { assessment_id: id, status: status.to_string() });
    if let Some(bench) = &outcome.benchmark {
        state.publish(AppEvent::BenchmarkUpdated {
            cohort: bench.cohort().to_string(),
            sample_size: bench.sample_size,
            average_score: bench.aggregate.average_score,
        });
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("Assessment {status} successfully"),
        "assessment": outcome.assessment,
        "benchmark": outcome.benchmark,
    })))
}

/// POST /api/assessments/{id}/comments
pub async fn add_comment(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NewComment>,
) -> Result<impl IntoResponse, ApiError> {
    let assessment = state.service.add_comment(id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "comments": assessment.comments })),
    ))
}

/// GET /api/assessments/{id}/suggestions
pub async fn suggestions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let suggestions = state.service.suggestions(id).await?;
    Ok(Json(json!({ "success": true, "suggestions": suggestions })))
}

/// GET /api/athletes/{id}/assessments?page=&limit=
pub async fn athlete_assessments(
    State(state): State<SharedState>,
    Path(athlete_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .service
        .athlete_assessments(athlete_id, params.page, params.limit)
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

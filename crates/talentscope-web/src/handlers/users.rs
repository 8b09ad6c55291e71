//! User registration, profiles, search and the points leaderboard.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use talentscope_common::{ApiError, UserRole};
use talentscope_scorer::{NewUser, ProfileUpdate, UserFilter, DEFAULT_POINTS_BOARD};
use uuid::Uuid;

use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub viewer_id: Uuid,
    pub q: Option<String>,
    pub role: Option<UserRole>,
    pub state: Option<String>,
    pub sport: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct PointsParams {
    #[serde(default = "default_role")]
    pub role: UserRole,
    pub state: Option<String>,
    #[serde(default = "default_board")]
    pub limit: usize,
}

fn default_page() -> usize { 1 }
fn default_limit() -> usize { 20 }
fn default_role() -> UserRole { UserRole::Athlete }
fn default_board() -> usize { DEFAULT_POINTS_BOARD }

/// POST /api/users
pub async fn create_user(
    State(state): State<SharedState>,
    Json(req): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.service.register_user(req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "user": user }))))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.service.user(id).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProfileUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.service.update_profile(id, req).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": user,
    })))
}

/// GET /api/users/search?viewer_id=&q=&role=&state=&sport=&page=&limit=
pub async fn search_users(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = UserFilter { search: params.q, role: params.role, state: params.state, sport: params.sport };
    let page = state
        .service
        .search_users(params.viewer_id, &filter, params.page, params.limit)
        .await?;
    Ok(Json(json!({
        "success": true,
        "users": page.items,
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "total": page.total,
            "pages": page.pages,
        },
    })))
}

/// GET /api/users/leaderboard?role=&state=&limit=
pub async fn points_leaderboard(
    State(state): State<SharedState>,
    Query(params): Query<PointsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .service
        .points_leaderboard(params.role, params.state.as_deref(), params.limit)
        .await?;
    Ok(Json(json!({ "success": true, "leaderboard": entries })))
}

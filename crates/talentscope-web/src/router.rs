//! Axum router: maps all URL paths to handlers.

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    assessments::{add_comment, athlete_assessments, get_assessment, submit_assessment, suggestions, verify_assessment},
    benchmarks::get_benchmark,
    dashboard::{athletes, bulk_verify, dashboard_stats, pending_assessments},
    leaderboard::leaderboard,
    sports::{categories, test_details, tests},
    system::health,
    users::{create_user, get_user, points_leaderboard, search_users, update_user},
};
use crate::sse::sse_handler;
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/api/health", get(health))

        // Users
        .route("/api/users",             post(create_user))
        .route("/api/users/search",      get(search_users))
        .route("/api/users/leaderboard", get(points_leaderboard))
        .route("/api/users/{id}",        get(get_user).put(update_user))

        // Assessments
        .route("/api/assessments",                  post(submit_assessment))
        .route("/api/assessments/{id}",             get(get_assessment))
        .route("/api/assessments/{id}/verify",      put(verify_assessment))
        .route("/api/assessments/{id}/comments",    post(add_comment))
        .route("/api/assessments/{id}/suggestions", get(suggestions))
        .route("/api/athletes/{id}/assessments",    get(athlete_assessments))

        // Rankings
        .route("/api/leaderboard/{test_type}", get(leaderboard))
        .route("/api/benchmarks/{test_type}/{age_group}/{gender}", get(get_benchmark))

        // Dashboards
        .route("/api/dashboard/pending-assessments", get(pending_assessments))
        .route("/api/dashboard/bulk-verify",         post(bulk_verify))
        .route("/api/dashboard/athletes",            get(athletes))
        .route("/api/dashboard/{user_id}",           get(dashboard_stats))

        // Test catalogue
        .route("/api/sports/categories",        get(categories))
        .route("/api/sports/tests",             get(tests))
        .route("/api/sports/tests/{test_type}", get(test_details))

        // SSE streaming
        .route("/api/events", get(sse_handler))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

//! Liveness and build information.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::SharedState;

/// GET /api/health
pub async fn health(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "analysis_provider": state.service.analysis_provider().name(),
        "subscribers": state.event_tx.receiver_count(),
    }))
}

//! Service-level handlers (health, readiness)

use crate::{ApiError, AppState};
use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

/// GET /health - Liveness; never touches the engine
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /ready - Readiness; the engine must answer its own health check
pub async fn readiness(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let engine = state.engine.health().await?;
    Ok(Json(json!({ "status": "ready", "engine": engine })))
}

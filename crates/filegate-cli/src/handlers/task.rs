//! Task status handler

use crate::{ApiError, AppState, validation};
use axum::{
    Json,
    extract::{Path, State},
};
use filegate_engine::EngineResponse;
use std::sync::Arc;

/// GET /tasks/{id} - Live pass-through of the engine's task status.
/// Read-only, so clients may poll it as often as they like.
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EngineResponse>, ApiError> {
    let task_id = validation::task_id(&id)?;
    let response = state.engine.get_task(&task_id).await?;
    Ok(Json(response))
}

//! Folder handlers

use crate::auth::hash_identity;
use crate::handlers::JsonBody;
use crate::{ApiError, AppState, validation};
use axum::{
    Json,
    extract::{Extension, State},
};
use filegate_engine::{CreateFolder, EngineResponse, Identity};
use std::sync::Arc;
use tracing::info;

/// POST /folders - Create a folder, attributed to the caller
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    JsonBody(body): JsonBody,
) -> Result<Json<EngineResponse>, ApiError> {
    let spec = validation::folder(&body)?;

    // createdBy always comes from the resolved identity, never the body
    let request = CreateFolder::new(spec.path, spec.folder_name, identity);
    let response = state.engine.create_folder(&request).await?;

    info!(
        actor = %hash_identity(&request.created_by),
        path = %request.path,
        folder_name = %request.folder_name,
        "Folder creation forwarded"
    );

    Ok(Json(response))
}

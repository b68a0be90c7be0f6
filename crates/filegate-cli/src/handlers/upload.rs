//! Two-phase upload handlers
//!
//! The gateway keeps nothing between the two calls. The `uploadId` returned
//! by initiate is the only continuity token, held by the client, and the
//! engine alone decides whether a completion is valid.

use crate::auth::hash_identity;
use crate::handlers::JsonBody;
use crate::{ApiError, AppState, validation};
use axum::{
    Json,
    extract::{Extension, State},
};
use filegate_engine::{CompleteUpload, EngineResponse, Identity, InitiateUpload};
use std::sync::Arc;
use tracing::info;

/// POST /uploads/initiate - Declare an upload, attributed to the caller
pub async fn initiate_upload(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    JsonBody(body): JsonBody,
) -> Result<Json<EngineResponse>, ApiError> {
    let spec = validation::upload_intent(&body)?;

    let intent = InitiateUpload::new(
        spec.path,
        spec.filename,
        spec.mime_type,
        identity,
        spec.attributes,
    );
    let response = state.engine.initiate_upload(&intent).await?;

    info!(
        actor = %hash_identity(&intent.created_by),
        path = %intent.path,
        filename = %intent.filename,
        upload_id = response.get("uploadId").and_then(|v| v.as_str()).unwrap_or("-"),
        "Upload initiated"
    );

    Ok(Json(response))
}

/// POST /uploads/complete - Finalize an upload by its handle.
///
/// The caller must be authenticated, but no identity is sent: the engine
/// correlates the handle with the actor bound at initiate time.
pub async fn complete_upload(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    JsonBody(body): JsonBody,
) -> Result<Json<EngineResponse>, ApiError> {
    let request = CompleteUpload::new(validation::upload_id(&body)?);
    let response = state.engine.complete_upload(&request).await?;

    info!(
        actor = %hash_identity(&identity),
        upload_id = %request.upload_id,
        task_id = response.get("taskId").and_then(|v| v.as_str()).unwrap_or("-"),
        "Upload completion forwarded"
    );

    Ok(Json(response))
}

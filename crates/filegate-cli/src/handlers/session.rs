//! Session handlers (login)

use crate::auth::{authenticate, hash_identity};
use crate::handlers::JsonBody;
use crate::{ApiError, AppState, validation};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Body of a successful login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// POST /login - Exchange credentials for a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody,
) -> Result<Json<LoginResponse>, ApiError> {
    let credentials = validation::login(&body)?;

    let tokens = state
        .tokens
        .as_ref()
        .ok_or_else(|| ApiError::unauthenticated("Login is not available on this gateway"))?;

    let identity = authenticate(&state.config.users, &credentials.email, &credentials.password)?;
    let issued = tokens.issue(&identity)?;

    info!(actor = %hash_identity(&identity), "Session token issued");

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_at: issued.expires_at,
    }))
}

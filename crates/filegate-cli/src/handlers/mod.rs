//! Gateway request handlers

pub mod folder;
pub mod service;
pub mod session;
pub mod task;
pub mod upload;

pub use folder::*;
pub use service::*;
pub use session::*;
pub use task::*;
pub use upload::*;

use crate::{ApiError, ValidationError};
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde_json::Value;

/// JSON body extractor whose rejections are validation errors on `body`
pub struct JsonBody(pub Value);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!("Rejected request body: {}", rejection);
                Err(ValidationError::malformed_body().into())
            }
        }
    }
}

//! Error types and gateway error codes

use crate::validation::ValidationError;
use axum::{
    Json,
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use filegate_engine::EngineError;
use serde_json::json;
use thiserror::Error;

/// Gateway error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unauthenticated,
    ValidationError,
    EngineRejected,
    EngineUnavailable,
    EngineTimeout,
    BadEngineResponse,
    SlowDown,
    InternalError,
}

impl ErrorCode {
    /// Get the error code string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Unauthenticated",
            Self::ValidationError => "ValidationError",
            Self::EngineRejected => "EngineRejected",
            // Same kind for clients; the status tells them apart
            Self::EngineUnavailable | Self::EngineTimeout => "EngineUnavailable",
            Self::BadEngineResponse => "BadEngineResponse",
            Self::SlowDown => "SlowDown",
            Self::InternalError => "InternalError",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            Self::EngineRejected | Self::BadEngineResponse => StatusCode::BAD_GATEWAY,
            Self::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::EngineTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::SlowDown => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a client may repeat the request as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EngineUnavailable | Self::EngineTimeout | Self::SlowDown)
    }
}

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Please reduce your request rate")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    /// Get the error code
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Unauthenticated(_) => ErrorCode::Unauthenticated,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::Engine(e) => match e {
                EngineError::Rejected { .. } => ErrorCode::EngineRejected,
                EngineError::Unavailable { timed_out: true, .. } => ErrorCode::EngineTimeout,
                EngineError::Unavailable { .. } => ErrorCode::EngineUnavailable,
                EngineError::InvalidResponse(_) => ErrorCode::BadEngineResponse,
                EngineError::Config(_) => ErrorCode::InternalError,
            },
            Self::RateLimited => ErrorCode::SlowDown,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error_code();

        // Engine rejections go back as the engine wrote them
        if let ApiError::Engine(EngineError::Rejected {
            status,
            body,
            content_type,
        }) = self
        {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            let content_type = content_type
                .and_then(|ct| HeaderValue::from_str(&ct).ok())
                .unwrap_or_else(|| HeaderValue::from_static("application/json"));

            return (
                status,
                [
                    (header::CONTENT_TYPE, content_type),
                    (
                        header::HeaderName::from_static("x-error-code"),
                        HeaderValue::from_static(code.as_str()),
                    ),
                ],
                Body::from(body),
            )
                .into_response();
        }

        match &self {
            ApiError::Internal(_) | ApiError::Engine(_) => tracing::error!("{}", self),
            _ => tracing::debug!("{}", self),
        }

        let mut error = json!({
            "code": code.as_str(),
            "message": self.to_string(),
            "retryable": code.is_retryable(),
        });
        if let ApiError::Validation(e) = &self {
            error["field"] = json!(e.field);
        }

        let mut response = (code.status_code(), Json(json!({ "error": error }))).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::HeaderName::from_static("x-error-code"),
            HeaderValue::from_static(code.as_str()),
        );
        if code == ErrorCode::Unauthenticated {
            headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

//! HTTP middleware for authentication, rate limiting, etc.

use crate::auth::{DEV_IDENTITY, extract_bearer_token, identity_from_claims};
use crate::{ApiError, AppState};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};
use filegate_engine::Identity;
use governor::{Quota, RateLimiter, state::keyed::DefaultKeyedStateStore};
use std::num::NonZeroU32;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Request correlation header
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Rate limiter type
pub type KeyedRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, governor::clock::DefaultClock>;

/// Create a rate limiter
pub fn create_rate_limiter(requests_per_second: u32) -> Arc<KeyedRateLimiter> {
    // GatewayConfig::validate rejects zero
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::keyed(Quota::per_second(rps)))
}

/// How often idle rate limiter entries are dropped
pub const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Periodically drop limiter entries for identities that have gone quiet.
///
/// The task holds a weak reference and ends once the limiter is dropped.
/// Returns `None` outside a Tokio runtime.
pub fn spawn_rate_limiter_sweeper(
    limiter: &Arc<KeyedRateLimiter>,
    every: Duration,
) -> Option<tokio::task::JoinHandle<()>> {
    let handle = tokio::runtime::Handle::try_current().ok()?;
    let limiter: Weak<KeyedRateLimiter> = Arc::downgrade(limiter);

    Some(handle.spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(limiter) = limiter.upgrade() else {
                break;
            };
            limiter.retain_recent();
            limiter.shrink_to_fit();
            tracing::debug!(tracked = limiter.len(), "Rate limiter swept");
        }
    }))
}

/// Authentication middleware: resolves the caller's identity once per request
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Skip auth if disabled
    if !state.config.auth_enabled {
        let identity = Identity::new(DEV_IDENTITY)
            .ok_or_else(|| ApiError::Internal("Invalid development identity".to_string()))?;
        request.extensions_mut().insert(identity);
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;

    let token = extract_bearer_token(auth_header)
        .ok_or_else(|| ApiError::unauthenticated("Invalid Authorization header format"))?;

    let tokens = state
        .tokens
        .as_ref()
        .ok_or_else(|| ApiError::Internal("JWT secret not configured".to_string()))?;

    let identity = identity_from_claims(tokens.validate(token)?)?;

    // Store identity in request extensions
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<KeyedRateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Identity is added by auth middleware
    let key = request
        .extensions()
        .get::<Identity>()
        .map(|identity| identity.as_str().to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    if limiter.check_key(&key).is_err() {
        return Err(ApiError::RateLimited);
    }

    Ok(next.run(request).await)
}

/// Request ID middleware - reuses a sane incoming `x-request-id`, otherwise mints one
pub async fn request_id_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= 128)
        .map(|id| id.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Request ID extension
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Logging middleware
pub async fn logging_middleware(
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}

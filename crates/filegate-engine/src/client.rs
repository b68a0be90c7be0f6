//! Main client implementation

use crate::{
    EngineConfig, EngineError, Result,
    types::*,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, header};
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

/// Operations the gateway forwards to the file engine.
///
/// Each call maps to exactly one engine request. Implementations must not
/// retry, batch or cache.
#[async_trait]
pub trait FileEngine: Send + Sync {
    /// `POST /folders`
    async fn create_folder(&self, request: &CreateFolder) -> Result<EngineResponse>;

    /// `POST /uploads/initiate`
    async fn initiate_upload(&self, request: &InitiateUpload) -> Result<EngineResponse>;

    /// `POST /uploads/complete`
    async fn complete_upload(&self, request: &CompleteUpload) -> Result<EngineResponse>;

    /// `GET /tasks/{id}`. Read-only and idempotent.
    async fn get_task(&self, task_id: &str) -> Result<EngineResponse>;

    /// `GET /health`
    async fn health(&self) -> Result<EngineResponse>;
}

/// HTTP client for the file engine
pub struct EngineClient {
    config: EngineConfig,
    base: Url,
    http: Client,
}

impl EngineClient {
    /// Create a new client with the given configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        let base = parse_base_url(&config.base_url)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&config.user_agent)
                .map_err(|e| EngineError::Config(format!("Invalid user agent: {}", e)))?,
        );

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            // Following a redirect would replay the request as a second engine call
            .redirect(reqwest::redirect::Policy::none())
            .default_headers(headers)
            .build()
            .map_err(|e| EngineError::Config(e.to_string()))?;

        Ok(Self { config, base, http })
    }

    /// Create with base URL and default settings
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::new(EngineConfig::new(base_url))
    }

    /// Get the configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==================== Helper Methods ====================

    /// Resolve path segments against the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // parse_base_url rejects cannot-be-a-base URLs, so this always succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn post<B>(&self, segments: &[&str], body: &B) -> Result<EngineResponse>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.endpoint(segments);
        debug!("Sending POST request to {}", url);
        self.execute(self.http.post(url).json(body)).await
    }

    async fn get(&self, segments: &[&str]) -> Result<EngineResponse> {
        let url = self.endpoint(segments);
        debug!("Sending GET request to {}", url);
        self.execute(self.http.get(url)).await
    }

    async fn execute(&self, request: RequestBuilder) -> Result<EngineResponse> {
        let request = match &self.config.service_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(EngineError::transport)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await.map_err(EngineError::transport)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Engine rejected request");
            return Err(EngineError::Rejected {
                status: status.as_u16(),
                body,
                content_type,
            });
        }

        decode_body(&body)
    }
}

#[async_trait]
impl FileEngine for EngineClient {
    #[instrument(skip(self, request), fields(path = %request.path, folder_name = %request.folder_name))]
    async fn create_folder(&self, request: &CreateFolder) -> Result<EngineResponse> {
        self.post(&["folders"], request).await
    }

    #[instrument(skip(self, request), fields(path = %request.path, filename = %request.filename))]
    async fn initiate_upload(&self, request: &InitiateUpload) -> Result<EngineResponse> {
        self.post(&["uploads", "initiate"], request).await
    }

    #[instrument(skip(self, request), fields(upload_id = %request.upload_id))]
    async fn complete_upload(&self, request: &CompleteUpload) -> Result<EngineResponse> {
        self.post(&["uploads", "complete"], request).await
    }

    #[instrument(skip(self))]
    async fn get_task(&self, task_id: &str) -> Result<EngineResponse> {
        self.get(&["tasks", task_id]).await
    }

    #[instrument(skip(self))]
    async fn health(&self) -> Result<EngineResponse> {
        self.get(&["health"]).await
    }
}

// ==================== Response Parsers ====================

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| EngineError::Config(format!("Invalid engine URL {:?}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(EngineError::Config(format!(
            "Unsupported engine URL scheme: {}",
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() {
        return Err(EngineError::Config(format!("Engine URL cannot be a base: {}", raw)));
    }

    Ok(url)
}

/// Decode a successful engine body. Empty bodies become `null`.
fn decode_body(body: &[u8]) -> Result<EngineResponse> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(EngineResponse::Null);
    }
    serde_json::from_slice(body).map_err(|e| EngineError::InvalidResponse(e.to_string()))
}

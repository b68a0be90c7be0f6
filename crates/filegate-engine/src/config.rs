//! Engine client configuration

use std::time::Duration;

/// Engine client configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Engine base URL, e.g. `http://file-engine:8080` or `http://host/api/v1`
    pub base_url: String,
    /// Total time budget for a single engine call
    pub timeout: Duration,
    /// Time budget for establishing the connection
    pub connect_timeout: Duration,
    /// Service token presented to the engine as a bearer credential
    pub service_token: Option<String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            service_token: None,
            user_agent: format!("filegate-engine/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl EngineConfig {
    /// Create a new config with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the service token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.service_token = Some(token.into());
        self
    }

    /// Set the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

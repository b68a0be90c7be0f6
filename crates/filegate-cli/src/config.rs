//! Gateway configuration

use anyhow::{Context, bail};
use filegate_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Gateway server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL of the backend file engine
    pub engine_url: String,
    /// Upper bound for a single engine call (milliseconds)
    pub engine_timeout_ms: u64,
    /// Upper bound for connecting to the engine (milliseconds)
    pub engine_connect_timeout_ms: u64,
    /// Bearer token presented to the engine
    pub engine_token: Option<String>,
    /// JWT secret for issuing and validating session tokens
    pub jwt_secret: Option<String>,
    /// Expected `iss` claim
    pub jwt_issuer: Option<String>,
    /// Expected `aud` claim
    pub jwt_audience: Option<String>,
    /// Lifetime of tokens issued by `/login` (seconds)
    pub token_ttl_secs: u64,
    /// Enable authentication
    pub auth_enabled: bool,
    /// Accounts accepted by `/login`
    pub users: Vec<UserCredential>,
    /// Rate limit (requests per second per identity)
    pub rate_limit_rps: u32,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// Enable CORS
    pub cors_enabled: bool,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
}

/// A login account
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserCredential {
    /// Login name, becomes the identity
    pub email: String,
    /// Hex digest from `filegate-gateway --hash-password`
    pub password_blake3: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            engine_url: "http://localhost:8080".to_string(),
            engine_timeout_ms: 30_000,
            engine_connect_timeout_ms: 5_000,
            engine_token: None,
            jwt_secret: None,
            jwt_issuer: None,
            jwt_audience: None,
            token_ttl_secs: 60 * 60, // 1 hour
            auth_enabled: true,
            users: Vec::new(),
            rate_limit_rps: 100,
            max_body_size: 1024 * 1024, // 1 MB, bodies are metadata only
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl GatewayConfig {
    /// Load from a config file (TOML, JSON or YAML by extension), with
    /// `FILEGATE__<FIELD>` environment variables layered on top
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::load(Some(path.as_ref()))
    }

    /// Defaults, then the optional config file, then `FILEGATE__<FIELD>`
    /// environment variables
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`GatewayConfig::load`], reading the environment from `env`
    /// instead of the process when given
    fn load_with_env(
        path: Option<&Path>,
        env: Option<::config::Map<String, String>>,
    ) -> anyhow::Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }

        let source = path.map_or_else(|| "defaults".to_string(), |p| p.display().to_string());
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix("FILEGATE")
                    .separator("__")
                    .source(env),
            )
            .build()
            .with_context(|| format!("failed to load configuration from {}", source))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration from {}", source))
    }

    /// Reject settings the gateway cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth_enabled && self.jwt_secret.as_deref().is_none_or(str::is_empty) {
            bail!("authentication is enabled but no JWT secret is configured");
        }
        if self.rate_limit_rps == 0 {
            bail!("rate_limit_rps must be greater than zero");
        }
        if self.engine_timeout_ms == 0 || self.engine_connect_timeout_ms == 0 {
            bail!("engine timeouts must be greater than zero");
        }
        if self.token_ttl_secs == 0 {
            bail!("token_ttl_secs must be greater than zero");
        }
        for user in &self.users {
            if blake3::Hash::from_hex(&user.password_blake3).is_err() {
                bail!(
                    "user {}: password_blake3 must be a 64 character hex digest",
                    user.email
                );
            }
        }
        Ok(())
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings for the engine client
    pub fn engine_config(&self) -> EngineConfig {
        let config = EngineConfig::new(self.engine_url.clone())
            .with_timeout(Duration::from_millis(self.engine_timeout_ms))
            .with_connect_timeout(Duration::from_millis(self.engine_connect_timeout_ms));

        match &self.engine_token {
            Some(token) => config.with_token(token.clone()),
            None => config,
        }
    }
}

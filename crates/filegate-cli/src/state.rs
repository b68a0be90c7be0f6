//! Application state

use crate::auth::TokenAuthority;
use crate::config::GatewayConfig;
use filegate_engine::{EngineClient, FileEngine};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers.
///
/// Read-only after startup: handlers never mutate it, so requests need no
/// coordination beyond the engine client's own connection pool.
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Backend file engine
    pub engine: Arc<dyn FileEngine>,
    /// Session token signer/verifier, absent when no secret is configured
    pub tokens: Option<TokenAuthority>,
}

impl AppState {
    /// Create a new application state talking to the configured engine
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let engine = EngineClient::new(config.engine_config())?;
        info!("Engine client ready for {}", config.engine_url);
        Self::with_engine(config, Arc::new(engine))
    }

    /// Create state around an existing engine implementation
    pub fn with_engine(config: GatewayConfig, engine: Arc<dyn FileEngine>) -> anyhow::Result<Self> {
        config.validate()?;

        let tokens = TokenAuthority::from_config(&config);
        if !config.auth_enabled {
            warn!("⚠ Authentication is DISABLED - every request acts as the development identity");
        }
        if tokens.is_some() && config.users.is_empty() {
            warn!("No login accounts configured - /login will reject every attempt");
        }

        Ok(Self {
            config,
            engine,
            tokens,
        })
    }
}

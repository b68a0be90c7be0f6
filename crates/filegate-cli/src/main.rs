//! Filegate Gateway - authenticated front door for the file engine

use clap::Parser;
use filegate_cli::{GatewayConfig, auth, run_server_with_shutdown};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "filegate-gateway")]
#[command(about = "Authenticated API gateway in front of the Filegate file engine")]
#[command(version)]
struct Args {
    /// Config file (TOML, JSON or YAML)
    #[arg(short, long, env = "FILEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(short = 'H', long, env = "FILEGATE_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "FILEGATE_PORT")]
    port: Option<u16>,

    /// Base URL of the file engine
    #[arg(long, env = "ENGINE_URL")]
    engine_url: Option<String>,

    /// Engine call timeout in milliseconds
    #[arg(long, env = "ENGINE_TIMEOUT_MS")]
    engine_timeout_ms: Option<u64>,

    /// Engine connect timeout in milliseconds
    #[arg(long, env = "ENGINE_CONNECT_TIMEOUT_MS")]
    engine_connect_timeout_ms: Option<u64>,

    /// Bearer token presented to the engine
    #[arg(long, env = "ENGINE_TOKEN")]
    engine_token: Option<String>,

    /// JWT secret for issuing and validating session tokens
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Expected JWT issuer
    #[arg(long, env = "JWT_ISSUER")]
    jwt_issuer: Option<String>,

    /// Expected JWT audience
    #[arg(long, env = "JWT_AUDIENCE")]
    jwt_audience: Option<String>,

    /// Lifetime of issued session tokens in seconds
    #[arg(long, env = "TOKEN_TTL_SECS")]
    token_ttl_secs: Option<u64>,

    /// Disable authentication (for development only!)
    #[arg(long, env = "FILEGATE_NO_AUTH")]
    no_auth: bool,

    /// Enable debug logging
    #[arg(short, long, env = "FILEGATE_DEBUG")]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "FILEGATE_LOG_JSON")]
    log_json: bool,

    /// Print the password_blake3 digest for a login password and exit
    #[arg(long, value_name = "PASSWORD")]
    hash_password: Option<String>,
}

impl Args {
    /// Defaults, then the config file, then flags and environment
    fn into_config(self) -> anyhow::Result<GatewayConfig> {
        let mut config = GatewayConfig::load(self.config.as_deref())?;

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = self.engine_url {
            config.engine_url = url;
        }
        if let Some(ms) = self.engine_timeout_ms {
            config.engine_timeout_ms = ms;
        }
        if let Some(ms) = self.engine_connect_timeout_ms {
            config.engine_connect_timeout_ms = ms;
        }
        if self.engine_token.is_some() {
            config.engine_token = self.engine_token;
        }
        if self.jwt_secret.is_some() {
            config.jwt_secret = self.jwt_secret;
        }
        if self.jwt_issuer.is_some() {
            config.jwt_issuer = self.jwt_issuer;
        }
        if self.jwt_audience.is_some() {
            config.jwt_audience = self.jwt_audience;
        }
        if let Some(ttl) = self.token_ttl_secs {
            config.token_ttl_secs = ttl;
        }
        if self.no_auth {
            config.auth_enabled = false;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse arguments
    let args = Args::parse();

    if let Some(password) = &args.hash_password {
        println!("{}", auth::password_digest(password).to_hex());
        return Ok(());
    }

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "filegate_cli={0},filegate_engine={0},tower_http={0}",
            log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config = args.into_config()?;

    tracing::info!("Starting Filegate gateway on {}", config.bind_addr());
    tracing::info!(
        "File engine: {} (timeout {} ms)",
        config.engine_url,
        config.engine_timeout_ms
    );

    // Run the server
    run_server_with_shutdown(config, shutdown_signal()).await
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

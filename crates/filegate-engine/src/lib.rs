//! # Filegate Engine Client
//!
//! A thin, typed client for the backend file engine that performs the actual
//! folder, object and task work behind the Filegate gateway.
//!
//! ## Features
//!
//! - **One call per operation**: every method issues exactly one HTTP request,
//!   with no batching, caching or retries
//! - **Opaque responses**: engine bodies are returned as untyped JSON so the
//!   engine can evolve its schema freely
//! - **Attribution by construction**: mutating requests carry a required
//!   [`Identity`], so an unattributed call cannot be built
//! - **Error normalization**: transport failures and engine rejections map to
//!   distinct [`EngineError`] kinds
//!
//! ## Example
//!
//! ```rust,ignore
//! use filegate_engine::{CreateFolder, EngineClient, EngineConfig, FileEngine, Identity};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = EngineClient::new(EngineConfig::new("http://localhost:8080"))?;
//!
//!     let owner = Identity::new("alice@example.com").expect("non-empty identity");
//!     let body = client
//!         .create_folder(&CreateFolder::new("/docs", "reports", owner))
//!         .await?;
//!     println!("engine said: {body}");
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::{EngineClient, FileEngine};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use types::*;

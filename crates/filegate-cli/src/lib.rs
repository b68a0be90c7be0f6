//! # Filegate Gateway
//!
//! Authenticated API gateway in front of the Filegate file engine.
//!
//! This crate provides:
//! - **Gateway API**: folder creation, two-phase uploads and task polling
//! - **Authentication**: JWT bearer tokens, with a login endpoint that issues them
//! - **Attribution**: every mutating engine call carries the caller's identity
//! - **Rate Limiting**: Per-identity request throttling
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! │            (web app, CLI, curl, etc.)               │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                  Filegate Gateway                   │
//! ├─────────────────────────────────────────────────────┤
//! │  Auth Middleware │ Rate Limiter │ Request Validator │
//! ├─────────────────────────────────────────────────────┤
//! │                Operation Handlers                   │
//! │  (CreateFolder, InitiateUpload, CompleteUpload,     │
//! │   GetTask)                                          │
//! ├─────────────────────────────────────────────────────┤
//! │                  filegate-engine                    │
//! │            (typed HTTP engine client)               │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                  Backend File Engine                │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod validation;

pub use config::{GatewayConfig, UserCredential};
pub use error::{ApiError, ErrorCode};
pub use server::{run_server, run_server_with_shutdown, serve_on};
pub use state::AppState;
pub use validation::ValidationError;

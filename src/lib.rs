//! Filegate: an authenticated gateway in front of a file engine.
//!
//! - [`gateway`]: the HTTP server (`filegate-gateway` binary)
//! - [`engine`]: typed client for the file engine API

pub use filegate_cli as gateway;
pub use filegate_engine as engine;

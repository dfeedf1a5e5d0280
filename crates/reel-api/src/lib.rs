//! Axum HTTP API server.
//!
//! This crate provides:
//! - Synchronous and background generation endpoints
//! - Job status, history and live progress (SSE and WebSocket)
//! - Render pass-through for finished specifications
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;
pub mod stream;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::JobReaper;
pub use state::AppState;

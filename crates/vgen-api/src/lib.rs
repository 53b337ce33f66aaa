//! Axum HTTP API server.
//!
//! This crate provides:
//! - REST endpoints for submitting, listing, retrying and deleting jobs
//! - Video download for completed jobs
//! - API key connection management
//! - Health/readiness probes and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

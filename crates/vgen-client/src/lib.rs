//! Client for the Veo video generation API.
//!
//! This crate provides:
//! - The `VideoGenerator` contract used by the job queue
//! - `VeoClient`, which drives a Veo long-running operation to completion
//! - API key selection state
//! - Error classification (transient, session-invalid)

pub mod config;
pub mod error;
pub mod generator;
pub mod keys;
pub mod retry;
pub mod veo;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, SESSION_INVALID_MARKER};
pub use generator::VideoGenerator;
pub use keys::ApiKeySelector;
pub use retry::RetryConfig;
pub use veo::VeoClient;

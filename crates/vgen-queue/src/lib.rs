//! Prompt-to-video job queue.
//!
//! This crate provides:
//! - An in-memory, insertion-ordered job store
//! - A bounded (single-flight by default) processor draining pending jobs
//! - The readiness contract used to gate generation on a selected API key
//! - A facade exposing the user actions: add, retry, delete, clear, connect

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod processor;
pub mod queue;
pub mod readiness;
pub mod store;

pub use config::{QueueConfig, MAX_CONCURRENT_JOBS};
pub use error::{QueueError, QueueResult};
pub use logging::JobLogger;
pub use processor::{QueueProcessor, GENERATION_PANICKED, PRECONDITION_NOT_MET};
pub use queue::JobQueue;
pub use readiness::Readiness;
pub use store::JobStore;

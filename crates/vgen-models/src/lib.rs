//! Shared data models for the video generation queue.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their lifecycle transitions
//! - Job status values
//! - Generation configuration (model, resolution, aspect ratio)
//! - Generated video results
//! - Prompt batch parsing

pub mod generation;
pub mod job;
pub mod job_status;
pub mod style;
pub mod utils;

// Re-export common types
pub use generation::{GenerationConfig, VideoResult, DEFAULT_VIDEO_MIME_TYPE, DEFAULT_VEO_MODEL};
pub use job::{Job, JobId, JobUpdate, TransitionError};
pub use job_status::{JobCounts, JobStatus};
pub use style::{AspectRatio, AspectRatioParseError, Resolution, ResolutionParseError};
pub use utils::parse_prompts;

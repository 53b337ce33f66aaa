//! The generation contract consumed by the job queue.

use async_trait::async_trait;
use vgen_models::{GenerationConfig, VideoResult};

use crate::error::ClientResult;

/// Turns a text prompt into a finished video.
///
/// Implementations must not return until the remote work is done or has
/// failed; no partial results are exposed.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> ClientResult<VideoResult>;
}

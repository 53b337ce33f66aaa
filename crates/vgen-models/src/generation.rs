//! Generation configuration and generated video results.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{AspectRatio, Resolution};

/// Default Veo model used for generation.
pub const DEFAULT_VEO_MODEL: &str = "veo-3.1-fast-generate-preview";

/// Content type assumed when the remote service does not report one.
pub const DEFAULT_VIDEO_MIME_TYPE: &str = "video/mp4";

/// Fixed generation parameters shared by every job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model variant
    pub model: String,
    /// Output resolution
    #[serde(default)]
    pub resolution: Resolution,
    /// Output aspect ratio
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_VEO_MODEL.to_string(),
            resolution: Resolution::default(),
            aspect_ratio: AspectRatio::default(),
        }
    }
}

/// A generated video owned by its job.
///
/// The binary payload is kept in memory and never serialized with the job;
/// it is dropped together with the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResult {
    /// Location the video was retrieved from
    pub uri: String,
    /// Content type of the payload
    pub mime_type: String,
    /// Payload size in bytes
    pub size_bytes: usize,
    /// Raw video bytes
    #[serde(skip)]
    pub bytes: Bytes,
}

impl VideoResult {
    pub fn new(uri: impl Into<String>, mime_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            uri: uri.into(),
            mime_type: mime_type.into(),
            size_bytes: bytes.len(),
            bytes,
        }
    }
}

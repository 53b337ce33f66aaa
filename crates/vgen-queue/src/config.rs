//! Queue configuration.

use vgen_models::{GenerationConfig, DEFAULT_VEO_MODEL};

use crate::error::{QueueError, QueueResult};

/// Upper bound on concurrent generations.
pub const MAX_CONCURRENT_JOBS: usize = 64;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum jobs generating at the same time (1 = single-flight, at most 64)
    pub max_concurrent_jobs: usize,
    /// Generation parameters applied to every job
    pub generation: GenerationConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 1,
            generation: GenerationConfig::default(),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    ///
    /// Malformed resolution or aspect ratio values are rejected rather than
    /// silently replaced, so a typo does not change the output format.
    pub fn from_env() -> QueueResult<Self> {
        let max_concurrent_jobs = std::env::var("QUEUE_MAX_CONCURRENT_JOBS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        let mut generation = GenerationConfig {
            model: std::env::var("VEO_MODEL").unwrap_or_else(|_| DEFAULT_VEO_MODEL.to_string()),
            ..Default::default()
        };
        if let Ok(resolution) = std::env::var("VEO_RESOLUTION") {
            generation.resolution = resolution
                .parse()
                .map_err(|e| QueueError::config(format!("VEO_RESOLUTION: {}", e)))?;
        }
        if let Ok(aspect_ratio) = std::env::var("VEO_ASPECT_RATIO") {
            generation.aspect_ratio = aspect_ratio
                .parse()
                .map_err(|e| QueueError::config(format!("VEO_ASPECT_RATIO: {}", e)))?;
        }

        Ok(Self {
            max_concurrent_jobs,
            generation,
        }
        .validated())
    }

    /// Set the number of concurrent generations.
    pub fn with_max_concurrent_jobs(mut self, max_concurrent_jobs: usize) -> Self {
        self.max_concurrent_jobs = max_concurrent_jobs;
        self.validated()
    }

    /// Number of generation slots, within `1..=MAX_CONCURRENT_JOBS`.
    pub fn permits(&self) -> usize {
        self.max_concurrent_jobs.clamp(1, MAX_CONCURRENT_JOBS)
    }

    fn validated(mut self) -> Self {
        self.max_concurrent_jobs = self.permits();
        self
    }
}

//! Application state.

use std::sync::Arc;

use vgen_client::{ApiKeySelector, VeoClient};
use vgen_queue::{JobQueue, QueueConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub queue: Arc<JobQueue>,
}

impl AppState {
    /// Create new application state backed by the Veo client.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let keys = Arc::new(ApiKeySelector::from_env());
        let client = VeoClient::from_env(Arc::clone(&keys))?;
        let queue_config = QueueConfig::from_env()?;

        let queue = JobQueue::new(Arc::new(client), keys, queue_config);

        Ok(Self::with_queue(config, queue))
    }

    /// Create state around an existing queue.
    pub fn with_queue(config: ApiConfig, queue: JobQueue) -> Self {
        Self {
            config,
            queue: Arc::new(queue),
        }
    }
}

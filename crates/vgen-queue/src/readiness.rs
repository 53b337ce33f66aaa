//! Readiness of the generation client.
//!
//! The processor checks readiness before every generation; a job is failed
//! immediately instead of making a call that cannot succeed.

use async_trait::async_trait;
use vgen_client::ApiKeySelector;

/// Whether the external client is authorized to make requests.
#[async_trait]
pub trait Readiness: Send + Sync {
    /// True when generation requests may be made.
    async fn is_ready(&self) -> bool;

    /// Run the selection flow with an optional explicit credential.
    ///
    /// Returns whether the client is ready afterwards.
    async fn request_selection(&self, credential: Option<String>) -> bool;

    /// Drop the cached authorization so selection has to run again.
    async fn invalidate(&self);
}

#[async_trait]
impl Readiness for ApiKeySelector {
    async fn is_ready(&self) -> bool {
        self.is_selected().await
    }

    async fn request_selection(&self, credential: Option<String>) -> bool {
        self.select(credential).await
    }

    async fn invalidate(&self) {
        self.clear().await;
    }
}

//! API key selection state.
//!
//! Holds the key the client authenticates with. A missing key means the
//! client is not ready; a key rejected by the API is cleared so the user has
//! to connect again.

use tokio::sync::RwLock;
use tracing::{info, warn};

/// Process-wide API key selection.
#[derive(Debug, Default)]
pub struct ApiKeySelector {
    selected: RwLock<Option<String>>,
    fallback: Option<String>,
}

impl ApiKeySelector {
    /// Create a selector with an initial key and no fallback.
    pub fn new(initial: Option<String>) -> Self {
        Self {
            selected: RwLock::new(normalize(initial)),
            fallback: None,
        }
    }

    /// Create a selector seeded from `GEMINI_API_KEY`.
    ///
    /// The environment key is also kept as the fallback used by `select(None)`.
    pub fn from_env() -> Self {
        let env_key = normalize(std::env::var("GEMINI_API_KEY").ok());
        Self {
            selected: RwLock::new(env_key.clone()),
            fallback: env_key,
        }
    }

    /// Set the key used when `select` is called without one.
    pub fn with_fallback(mut self, fallback: Option<String>) -> Self {
        self.fallback = normalize(fallback);
        self
    }

    /// The currently selected key, if any.
    pub async fn current(&self) -> Option<String> {
        self.selected.read().await.clone()
    }

    /// Whether a key is selected.
    pub async fn is_selected(&self) -> bool {
        self.selected.read().await.is_some()
    }

    /// Select a key, or the fallback key when none is supplied.
    ///
    /// Returns whether a key is selected afterwards.
    pub async fn select(&self, key: Option<String>) -> bool {
        let candidate = normalize(key).or_else(|| self.fallback.clone());
        let mut selected = self.selected.write().await;
        match candidate {
            Some(key) => {
                *selected = Some(key);
                info!("API key selected");
                true
            }
            None => {
                warn!("No API key supplied and no fallback key configured");
                selected.is_some()
            }
        }
    }

    /// Forget the selected key.
    pub async fn clear(&self) {
        let mut selected = self.selected.write().await;
        if selected.take().is_some() {
            warn!("API key cleared; a new key must be selected");
        }
    }
}

fn normalize(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

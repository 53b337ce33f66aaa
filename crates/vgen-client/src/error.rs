//! Video generation client error types.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Result type for video generation operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Message fragment the API returns when the key/session it was given is no longer valid.
pub const SESSION_INVALID_MARKER: &str = "requested entity was not found";

/// Errors that can occur while generating a video.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No API key selected")]
    MissingApiKey,

    #[error("Veo API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Video generation failed: {0}")]
    Operation(String),

    #[error("No video returned: {0}")]
    NoVideo(String),

    #[error("Failed to download video: {0}")]
    Download(String),

    #[error("Video generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl ClientError {
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build an error from a non-success HTTP response body.
    ///
    /// The message of a Google error envelope is surfaced as-is; any other body
    /// is kept verbatim.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        Self::Api { status, message }
    }

    /// HTTP status code, if the error came from an API response.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True if the selected key/session is no longer valid and must be re-selected.
    pub fn is_session_invalid(&self) -> bool {
        self.to_string()
            .to_lowercase()
            .contains(SESSION_INVALID_MARKER)
    }

    /// Check if error is transient and the request may be repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ClientError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

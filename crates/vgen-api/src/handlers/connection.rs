//! API key connection handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Connect request. An empty body or a missing key uses the configured
/// fallback key.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub ready: bool,
}

/// GET /api/connection
pub async fn get_connection(State(state): State<AppState>) -> Json<ConnectionResponse> {
    Json(ConnectionResponse {
        ready: state.queue.is_ready().await,
    })
}

/// POST /api/connection
pub async fn connect(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ConnectionResponse>> {
    let request = parse_connect_request(&body)?;
    state.queue.connect(request.api_key).await?;
    Ok(Json(ConnectionResponse { ready: true }))
}

/// DELETE /api/connection
pub async fn disconnect(State(state): State<AppState>) -> Json<ConnectionResponse> {
    state.queue.disconnect().await;
    Json(ConnectionResponse { ready: false })
}

fn parse_connect_request(body: &[u8]) -> ApiResult<ConnectRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ConnectRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid connect request: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connect_request() {
        assert!(parse_connect_request(b"").unwrap().api_key.is_none());
        assert!(parse_connect_request(b" \n").unwrap().api_key.is_none());
        assert!(parse_connect_request(b"{}").unwrap().api_key.is_none());

        let request = parse_connect_request(br#"{"api_key":"abc"}"#).unwrap();
        assert_eq!(request.api_key.as_deref(), Some("abc"));

        let err = parse_connect_request(b"{\"api_key\":").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}

//! Veo client over the Gemini REST API.
//!
//! A generation is a long-running operation: it is started with
//! `predictLongRunning`, polled until `done`, and the resulting video is
//! downloaded (or decoded when returned inline).

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use vgen_models::{GenerationConfig, VideoResult, DEFAULT_VIDEO_MIME_TYPE};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::generator::VideoGenerator;
use crate::keys::ApiKeySelector;
use crate::retry::retry_async;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Veo API client.
pub struct VeoClient {
    client: Client,
    config: ClientConfig,
    keys: Arc<ApiKeySelector>,
}

/// predictLongRunning request.
#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: Vec<Instance<'a>>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    aspect_ratio: String,
    resolution: String,
    number_of_videos: u32,
}

/// Long-running operation as returned by start and poll calls.
#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
    response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
    #[serde(default)]
    rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoRef {
    uri: Option<String>,
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

impl VeoClient {
    /// Create a new Veo client.
    pub fn new(config: ClientConfig, keys: Arc<ApiKeySelector>) -> ClientResult<Self> {
        Url::parse(&config.base_url).map_err(|e| {
            ClientError::config(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;

        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            config,
            keys,
        })
    }

    /// Create from environment variables.
    pub fn from_env(keys: Arc<ApiKeySelector>) -> ClientResult<Self> {
        Self::new(ClientConfig::from_env(), keys)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1beta/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Start the long-running generation. Not retried: a repeat could start a second job.
    async fn start_operation(
        &self,
        key: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> ClientResult<Operation> {
        let url = self.endpoint(&format!("models/{}:predictLongRunning", config.model));
        let request = PredictRequest {
            instances: vec![Instance { prompt }],
            parameters: Parameters {
                aspect_ratio: config.aspect_ratio.to_string(),
                resolution: config.resolution.as_str().to_string(),
                number_of_videos: 1,
            },
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, key)
            .json(&request)
            .send()
            .await?;

        parse_json(response).await
    }

    async fn get_operation(&self, url: &str, key: &str) -> ClientResult<Operation> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, key)
            .send()
            .await?;

        parse_json(response).await
    }

    /// Poll until the operation reports `done` or the poll budget runs out.
    async fn wait_for_completion(&self, key: &str, mut operation: Operation) -> ClientResult<Operation> {
        if !operation.done && operation.name.is_empty() {
            return Err(ClientError::InvalidResponse(
                "Operation started without a name".to_string(),
            ));
        }

        let started = Instant::now();
        let url = self.endpoint(&operation.name);

        while !operation.done {
            if started.elapsed() >= self.config.max_poll_duration {
                warn!(operation = %operation.name, "Video operation did not finish in time");
                return Err(ClientError::Timeout(self.config.max_poll_duration));
            }

            tokio::time::sleep(self.config.poll_interval).await;
            debug!(operation = %operation.name, "Polling video operation");

            let name = std::mem::take(&mut operation.name);
            operation = retry_async(&self.config.retry, || self.get_operation(&url, key)).await?;
            if operation.name.is_empty() {
                operation.name = name;
            }
        }

        Ok(operation)
    }

    async fn download(&self, uri: &str, key: &str) -> ClientResult<(Bytes, Option<String>)> {
        let response = self
            .client
            .get(uri)
            .header(API_KEY_HEADER, key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_http_status(status.as_u16(), &body));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        Ok((bytes, content_type))
    }

    /// Retrieve the payload referenced by a finished operation.
    async fn fetch_video(&self, key: &str, operation_name: &str, video: VideoRef) -> ClientResult<VideoResult> {
        if let Some(uri) = video.uri {
            let (bytes, content_type) = retry_async(&self.config.retry, || self.download(&uri, key))
                .await
                .map_err(|e| match e {
                    ClientError::Download(_) => e,
                    other => ClientError::download(other.to_string()),
                })?;

            let mime_type = video
                .mime_type
                .or(content_type)
                .unwrap_or_else(|| DEFAULT_VIDEO_MIME_TYPE.to_string());
            return Ok(VideoResult::new(uri, mime_type, bytes));
        }

        if let Some(encoded) = video.bytes_base64_encoded {
            let bytes = STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| ClientError::download(format!("Invalid inline video payload: {}", e)))?;
            let mime_type = video
                .mime_type
                .unwrap_or_else(|| DEFAULT_VIDEO_MIME_TYPE.to_string());
            return Ok(VideoResult::new(operation_name, mime_type, Bytes::from(bytes)));
        }

        Err(ClientError::NoVideo(
            "generated sample has neither a URI nor inline bytes".to_string(),
        ))
    }
}

#[async_trait]
impl VideoGenerator for VeoClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> ClientResult<VideoResult> {
        let key = self.keys.current().await.ok_or(ClientError::MissingApiKey)?;

        info!(
            model = %config.model,
            resolution = %config.resolution,
            aspect_ratio = %config.aspect_ratio,
            "Submitting video generation request"
        );
        let operation = self.start_operation(&key, prompt, config).await?;
        debug!(operation = %operation.name, "Video operation started");

        let operation = self.wait_for_completion(&key, operation).await?;
        let name = operation.name.clone();
        let video = finished_video(operation)?;

        let result = self.fetch_video(&key, &name, video).await?;
        info!(operation = %name, size_bytes = result.size_bytes, "Video generated");
        Ok(result)
    }
}

/// Pull the generated video out of a finished operation.
fn finished_video(operation: Operation) -> ClientResult<VideoRef> {
    if let Some(error) = operation.error {
        return Err(ClientError::operation(error.message));
    }

    let GenerateVideoResponse {
        generated_samples,
        rai_media_filtered_reasons,
    } = operation
        .response
        .and_then(|r| r.generate_video_response)
        .ok_or_else(|| ClientError::InvalidResponse("Operation finished without a video response".into()))?;

    generated_samples
        .into_iter()
        .find_map(|sample| sample.video)
        .ok_or_else(|| {
            if rai_media_filtered_reasons.is_empty() {
                ClientError::NoVideo("operation returned no generated samples".to_string())
            } else {
                ClientError::NoVideo(rai_media_filtered_reasons.join("; "))
            }
        })
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::from_http_status(status.as_u16(), &body));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        ClientError::InvalidResponse(format!("{}: {}", e, preview))
    })
}

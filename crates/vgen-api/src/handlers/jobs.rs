//! Job handlers.
//!
//! Provides REST API endpoints for:
//! - Submitting a batch of prompts (one job per non-empty line)
//! - Listing, inspecting, retrying and deleting jobs
//! - Downloading the generated video of a completed job

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use vgen_models::{Job, JobCounts, JobId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Types
// ============================================================================

/// Batch submission request.
#[derive(Debug, Deserialize)]
pub struct CreateJobsRequest {
    /// Prompts separated by newlines
    pub prompts: String,
}

/// Jobs created by a batch submission, in submission order.
#[derive(Debug, Serialize)]
pub struct CreateJobsResponse {
    pub jobs: Vec<Job>,
}

/// Job list response.
#[derive(Debug, Serialize)]
pub struct JobListResponse {
    /// Jobs, newest first
    pub jobs: Vec<Job>,
    pub counts: JobCounts,
}

#[derive(Debug, Serialize)]
pub struct ClearJobsResponse {
    pub removed: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/jobs
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    let mut jobs = state.queue.jobs().await;
    jobs.reverse();
    let counts = state.queue.stats().await;
    Json(JobListResponse { jobs, counts })
}

/// POST /api/jobs
pub async fn create_jobs(
    State(state): State<AppState>,
    Json(request): Json<CreateJobsRequest>,
) -> ApiResult<(StatusCode, Json<CreateJobsResponse>)> {
    let jobs = state.queue.add_batch(&request.prompts).await?;
    info!(count = jobs.len(), "Batch submitted");
    Ok((StatusCode::CREATED, Json(CreateJobsResponse { jobs })))
}

/// DELETE /api/jobs
pub async fn clear_jobs(State(state): State<AppState>) -> Json<ClearJobsResponse> {
    let removed = state.queue.clear().await;
    Json(ClearJobsResponse { removed })
}

/// GET /api/jobs/:job_id
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    let id = parse_job_id(&job_id)?;
    Ok(Json(state.queue.job(&id).await?))
}

/// DELETE /api/jobs/:job_id
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    let id = parse_job_id(&job_id)?;
    Ok(Json(state.queue.delete(&id).await?))
}

/// POST /api/jobs/:job_id/retry
pub async fn retry_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    let id = parse_job_id(&job_id)?;
    Ok(Json(state.queue.retry(&id).await?))
}

/// GET /api/jobs/:job_id/video
pub async fn get_job_video(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_job_id(&job_id)?;
    let video = state.queue.video(&id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, video.mime_type),
            (header::CONTENT_LENGTH, video.size_bytes.to_string()),
        ],
        Body::from(video.bytes),
    )
        .into_response())
}

/// Job ids are UUIDs; reject anything else before touching the store.
fn parse_job_id(raw: &str) -> ApiResult<JobId> {
    Uuid::parse_str(raw)
        .map(|uuid| JobId::from_string(uuid.to_string()))
        .map_err(|_| ApiError::bad_request(format!("Invalid job id: {}", raw)))
}

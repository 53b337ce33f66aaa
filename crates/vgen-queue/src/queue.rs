//! Job queue facade.
//!
//! Every user action goes through [`JobQueue`]. Each mutator ends by calling
//! [`QueueProcessor::try_advance`], so new or retried work is picked up
//! without a separate scheduler.

use std::sync::Arc;

use tracing::{debug, info};

use vgen_client::VideoGenerator;
use vgen_models::{parse_prompts, Job, JobCounts, JobId, JobUpdate, VideoResult};

use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};
use crate::metrics;
use crate::processor::QueueProcessor;
use crate::readiness::Readiness;
use crate::store::JobStore;

/// Prompt-to-video job queue.
#[derive(Clone)]
pub struct JobQueue {
    store: Arc<JobStore>,
    processor: Arc<QueueProcessor>,
    readiness: Arc<dyn Readiness>,
}

impl JobQueue {
    /// Create a new job queue with an empty store.
    pub fn new(
        generator: Arc<dyn VideoGenerator>,
        readiness: Arc<dyn Readiness>,
        config: QueueConfig,
    ) -> Self {
        let store = Arc::new(JobStore::new());
        let processor = Arc::new(QueueProcessor::new(
            Arc::clone(&store),
            generator,
            Arc::clone(&readiness),
            config,
        ));
        Self {
            store,
            processor,
            readiness,
        }
    }

    /// Create one pending job per non-empty line of `text`.
    pub async fn add_batch(&self, text: &str) -> QueueResult<Vec<Job>> {
        self.add_prompts(parse_prompts(text)).await
    }

    /// Create one pending job per prompt, in order.
    pub async fn add_prompts(&self, prompts: Vec<String>) -> QueueResult<Vec<Job>> {
        let jobs: Vec<Job> = prompts
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(Job::new)
            .collect();
        if jobs.is_empty() {
            return Err(QueueError::EmptyBatch);
        }

        let inserted = self.store.append(jobs.clone()).await;
        info!(count = inserted, "Enqueued jobs");
        metrics::record_jobs_enqueued(inserted);

        self.processor.try_advance();
        Ok(jobs)
    }

    /// Move a failed job back to pending.
    pub async fn retry(&self, id: &JobId) -> QueueResult<Job> {
        let job = self
            .store
            .update(id, JobUpdate::Retried)
            .await?
            .ok_or_else(|| QueueError::job_not_found(id.as_str()))?;
        info!(job_id = %id, "Job queued for retry");
        metrics::record_job_retried();

        self.processor.try_advance();
        Ok(job)
    }

    /// Remove a job and release its video.
    ///
    /// A generation already running for it keeps running; its result is
    /// discarded.
    pub async fn delete(&self, id: &JobId) -> QueueResult<Job> {
        let job = self
            .store
            .remove(id)
            .await
            .ok_or_else(|| QueueError::job_not_found(id.as_str()))?;
        debug!(job_id = %id, status = %job.status, "Job deleted");

        self.processor.try_advance();
        Ok(job)
    }

    /// Remove every job, returning how many were removed.
    pub async fn clear(&self) -> usize {
        let removed = self.store.clear().await;
        info!(removed, "Cleared all jobs");
        self.processor.try_advance();
        removed
    }

    /// Run the key selection flow, then re-check readiness.
    pub async fn connect(&self, credential: Option<String>) -> QueueResult<()> {
        let selected = self.readiness.request_selection(credential).await;
        // Selection reporting success is not trusted on its own.
        let ready = selected && self.readiness.is_ready().await;

        self.processor.try_advance();
        if ready {
            info!("Video generation client connected");
            Ok(())
        } else {
            Err(QueueError::not_connected(
                "API key selection did not complete; provide a key and try again",
            ))
        }
    }

    /// Drop the current key selection.
    pub async fn disconnect(&self) {
        self.readiness.invalidate().await;
        info!("Video generation client disconnected");
        self.processor.try_advance();
    }

    pub async fn is_ready(&self) -> bool {
        self.readiness.is_ready().await
    }

    /// All jobs in insertion order.
    pub async fn jobs(&self) -> Vec<Job> {
        self.store.snapshot().await
    }

    pub async fn job(&self, id: &JobId) -> QueueResult<Job> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| QueueError::job_not_found(id.as_str()))
    }

    /// The generated video of a completed job.
    pub async fn video(&self, id: &JobId) -> QueueResult<VideoResult> {
        let job = self.job(id).await?;
        job.result
            .ok_or_else(|| QueueError::NoVideo(format!("job {} is {}", id, job.status)))
    }

    /// Number of jobs in each status.
    pub async fn stats(&self) -> JobCounts {
        self.store.counts().await
    }

    /// Whether no generation is running right now.
    pub fn is_idle(&self) -> bool {
        self.processor.is_idle()
    }

    /// Ask the processor to pick up pending work.
    pub fn advance(&self) -> usize {
        self.processor.try_advance()
    }

    /// Wait until every pending job has reached a terminal state.
    pub async fn wait_idle(&self) {
        self.processor.wait_idle().await
    }

    pub fn config(&self) -> &QueueConfig {
        self.processor.config()
    }
}

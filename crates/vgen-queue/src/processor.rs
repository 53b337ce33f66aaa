//! Queue processor.
//!
//! Drains pending jobs in insertion order through the video generator.
//! Concurrency is bounded by a semaphore sized from
//! [`QueueConfig::max_concurrent_jobs`]; with the default of one permit the
//! processor is single-flight and at most one job is ever `Processing`.
//!
//! [`QueueProcessor::try_advance`] is the only entry point. It is cheap and
//! idempotent: when every permit is held, or nothing is pending, it does
//! nothing.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, Instrument};

use vgen_client::VideoGenerator;
use vgen_models::{Job, JobUpdate};

use crate::config::QueueConfig;
use crate::logging::JobLogger;
use crate::metrics::{self, FailureKind};
use crate::readiness::Readiness;
use crate::store::JobStore;

/// Error recorded on a job that was claimed while the client was not ready.
pub const PRECONDITION_NOT_MET: &str =
    "Precondition not met: no API key selected. Connect an API key and retry.";

/// Error recorded on a job whose generation task panicked.
pub const GENERATION_PANICKED: &str = "Video generation task panicked";

/// Drives jobs from the store through the generator.
pub struct QueueProcessor {
    store: Arc<JobStore>,
    generator: Arc<dyn VideoGenerator>,
    readiness: Arc<dyn Readiness>,
    slots: Arc<Semaphore>,
    config: QueueConfig,
}

impl QueueProcessor {
    pub fn new(
        store: Arc<JobStore>,
        generator: Arc<dyn VideoGenerator>,
        readiness: Arc<dyn Readiness>,
        config: QueueConfig,
    ) -> Self {
        let slots = Arc::new(Semaphore::new(config.permits()));
        Self {
            store,
            generator,
            readiness,
            slots,
            config,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Whether no generation is currently running.
    pub fn is_idle(&self) -> bool {
        self.slots.available_permits() == self.config.permits()
    }

    /// Start draining when a job is pending and a slot is free.
    ///
    /// Spawns at most one drain task per pending job and returns how many were
    /// spawned; with nothing pending, or every slot taken, it returns 0. Must
    /// be called from within a tokio runtime.
    pub fn try_advance(self: &Arc<Self>) -> usize {
        // A store locked for writing may be gaining jobs; assume work exists.
        let mut wanted = self.store.try_pending_count().unwrap_or(usize::MAX);
        let mut spawned = 0;
        while wanted > 0 {
            let Ok(permit) = self.slots.clone().try_acquire_owned() else {
                break;
            };
            let this = Arc::clone(self);
            tokio::spawn(async move {
                let processed = this.drain_with(permit).await;
                debug!(processed, "Queue drain finished");
            });
            spawned += 1;
            wanted -= 1;
        }
        spawned
    }

    /// Process pending jobs until none remain, holding `permit` throughout.
    async fn drain_with(self: Arc<Self>, mut permit: OwnedSemaphorePermit) -> usize {
        let mut processed = 0;
        loop {
            while let Some(job) = self.store.claim_next_pending().await {
                self.process(job).await;
                processed += 1;
            }
            drop(permit);

            // A job appended between the last claim and the release above saw
            // no free slot; pick it up here.
            if !self.store.has_pending().await {
                break;
            }
            match self.slots.clone().try_acquire_owned() {
                Ok(next) => permit = next,
                Err(_) => break,
            }
        }
        processed
    }

    /// Run one claimed job to a terminal state.
    async fn process(&self, job: Job) {
        let logger = JobLogger::new(&job.id, "generate_video", job.attempts);
        let span = logger.create_span();
        metrics::record_job_started();

        async {
            let (update, outcome) = self.generate(&job, &logger).await;

            match self.store.update(&job.id, update).await {
                Ok(Some(_)) => {}
                Ok(None) => debug!("Job removed while generating, result discarded"),
                Err(e) => logger.log_error(&format!("Failed to record outcome: {}", e)),
            }

            match outcome {
                Ok(duration) => metrics::record_job_completed(duration),
                Err(kind) => metrics::record_job_failed(kind),
            }
        }
        .instrument(span)
        .await
    }

    /// Call the generator and decide the job's terminal update.
    async fn generate(
        &self,
        job: &Job,
        logger: &JobLogger,
    ) -> (JobUpdate, Result<f64, FailureKind>) {
        if !self.readiness.is_ready().await {
            logger.log_warning(PRECONDITION_NOT_MET);
            return (
                JobUpdate::Failed(PRECONDITION_NOT_MET.to_string()),
                Err(FailureKind::Precondition),
            );
        }

        logger.log_start(&job.prompt);
        let started = Instant::now();
        let call = self.generator.generate(&job.prompt, &self.config.generation);

        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(video)) => {
                let elapsed = started.elapsed().as_secs_f64();
                logger.log_completion(&format!(
                    "{} bytes in {:.1}s",
                    video.size_bytes, elapsed
                ));
                (JobUpdate::Completed(video), Ok(elapsed))
            }
            Ok(Err(e)) => {
                let message = e.to_string();
                logger.log_error(&message);
                if e.is_session_invalid() {
                    info!("Session no longer valid, clearing API key selection");
                    self.readiness.invalidate().await;
                    metrics::record_session_invalidated();
                    (JobUpdate::Failed(message), Err(FailureKind::SessionInvalid))
                } else {
                    (JobUpdate::Failed(message), Err(FailureKind::Generation))
                }
            }
            Err(_) => {
                logger.log_error(GENERATION_PANICKED);
                (
                    JobUpdate::Failed(GENERATION_PANICKED.to_string()),
                    Err(FailureKind::Panic),
                )
            }
        }
    }

    /// Wait until nothing is pending and no generation is running.
    pub async fn wait_idle(self: &Arc<Self>) {
        let permits = self.config.permits() as u32;
        loop {
            match self.slots.acquire_many(permits).await {
                Ok(all) => drop(all),
                Err(_) => return,
            }
            if !self.store.has_pending().await {
                return;
            }
            self.try_advance();
            tokio::task::yield_now().await;
        }
    }
}

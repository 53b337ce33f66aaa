//! In-memory job store.
//!
//! Jobs are kept in insertion order. Every mutation replaces whole job
//! records under the store lock, keyed by id. Updates addressed to an id
//! that is no longer present are no-ops, so a job deleted while its
//! generation is in flight simply discards the late result.

use tokio::sync::RwLock;
use tracing::{debug, warn};

use vgen_models::{Job, JobCounts, JobId, JobStatus, JobUpdate, TransitionError};

/// Ordered collection of jobs.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<Vec<Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append jobs, preserving their relative order.
    ///
    /// Returns the number of jobs inserted; a job whose id is already present
    /// is skipped.
    pub async fn append(&self, new_jobs: Vec<Job>) -> usize {
        let mut jobs = self.jobs.write().await;
        let mut inserted = 0;
        for job in new_jobs {
            if jobs.iter().any(|existing| existing.id == job.id) {
                warn!(job_id = %job.id, "Duplicate job id rejected");
                continue;
            }
            jobs.push(job);
            inserted += 1;
        }
        inserted
    }

    /// Apply an update to the job with the given id.
    ///
    /// Returns the updated job, or `None` when the id is unknown.
    pub async fn update(&self, id: &JobId, update: JobUpdate) -> Result<Option<Job>, TransitionError> {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.iter_mut().find(|job| &job.id == id) else {
            debug!(job_id = %id, update = update.name(), "Update for missing job ignored");
            return Ok(None);
        };
        job.apply(update)?;
        Ok(Some(job.clone()))
    }

    /// Select the oldest pending job and mark it as processing.
    pub async fn claim_next_pending(&self) -> Option<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .iter_mut()
            .find(|job| job.status == JobStatus::Pending)?;
        job.apply(JobUpdate::Started).ok()?;
        Some(job.clone())
    }

    /// Remove a job. Its video payload is released with it.
    pub async fn remove(&self, id: &JobId) -> Option<Job> {
        let mut jobs = self.jobs.write().await;
        let index = jobs.iter().position(|job| &job.id == id)?;
        Some(jobs.remove(index))
    }

    /// Remove every job, returning how many were removed.
    pub async fn clear(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        let removed = jobs.len();
        jobs.clear();
        removed
    }

    /// Get a job by id.
    pub async fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().await.iter().find(|job| &job.id == id).cloned()
    }

    /// All jobs in insertion order.
    pub async fn snapshot(&self) -> Vec<Job> {
        self.jobs.read().await.clone()
    }

    /// Whether any job is waiting to be processed.
    pub async fn has_pending(&self) -> bool {
        self.jobs
            .read()
            .await
            .iter()
            .any(|job| job.status == JobStatus::Pending)
    }

    /// Number of pending jobs, without waiting for the lock.
    ///
    /// Returns `None` while the store is locked for writing.
    pub fn try_pending_count(&self) -> Option<usize> {
        let jobs = self.jobs.try_read().ok()?;
        Some(
            jobs.iter()
                .filter(|job| job.status == JobStatus::Pending)
                .count(),
        )
    }

    /// Number of jobs in each status.
    pub async fn counts(&self) -> JobCounts {
        let jobs = self.jobs.read().await;
        let mut counts = JobCounts::default();
        for job in jobs.iter() {
            counts.record(job.status);
        }
        counts
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

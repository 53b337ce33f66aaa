//! Job definitions and lifecycle transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::{JobStatus, VideoResult};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A state change applied to a job.
#[derive(Debug, Clone)]
pub enum JobUpdate {
    /// The processor picked the job up.
    Started,
    /// Generation succeeded.
    Completed(VideoResult),
    /// Generation (or its precondition) failed with a message.
    Failed(String),
    /// The user asked for another attempt.
    Retried,
}

impl JobUpdate {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            JobUpdate::Started => "start",
            JobUpdate::Completed(_) => "complete",
            JobUpdate::Failed(_) => "fail",
            JobUpdate::Retried => "retry",
        }
    }
}

/// An update that is not allowed from the job's current status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot {action} a job that is {from}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub action: &'static str,
}

/// One prompt-to-video unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Prompt sent to the generator
    pub prompt: String,

    /// Job status
    #[serde(default)]
    pub status: JobStatus,

    /// Generated video (only when completed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<VideoResult>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Started at timestamp (latest attempt)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Completed at timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Error message (only when failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Number of times the job entered processing
    #[serde(default)]
    pub attempts: u32,
}

impl Job {
    /// Create a new pending job for a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            prompt: prompt.into(),
            status: JobStatus::Pending,
            result: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
            attempts: 0,
        }
    }

    /// Apply a state change, enforcing the job state machine.
    ///
    /// Pending -> Processing -> Completed | Failed, and Failed -> Pending on retry.
    pub fn apply(&mut self, update: JobUpdate) -> Result<(), TransitionError> {
        let allowed = matches!(
            (self.status, &update),
            (JobStatus::Pending, JobUpdate::Started)
                | (JobStatus::Processing, JobUpdate::Completed(_))
                | (JobStatus::Processing, JobUpdate::Failed(_))
                | (JobStatus::Failed, JobUpdate::Retried)
        );
        if !allowed {
            return Err(TransitionError {
                from: self.status,
                action: update.name(),
            });
        }

        match update {
            JobUpdate::Started => self.start(),
            JobUpdate::Completed(video) => self.complete(video),
            JobUpdate::Failed(error) => self.fail(error),
            JobUpdate::Retried => self.reset_for_retry(),
        }
        Ok(())
    }

    fn start(&mut self) {
        self.status = JobStatus::Processing;
        self.started_at = Some(Utc::now());
        self.attempts += 1;
    }

    fn complete(&mut self, video: VideoResult) {
        self.status = JobStatus::Completed;
        self.result = Some(video);
        self.error = None;
        self.completed_at = Some(Utc::now());
    }

    fn fail(&mut self, error: String) {
        self.status = JobStatus::Failed;
        self.error = Some(error);
        self.result = None;
        self.completed_at = None;
    }

    fn reset_for_retry(&mut self) {
        self.status = JobStatus::Pending;
        self.error = None;
    }

    /// Check the status/result/error invariants hold.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            JobStatus::Completed => {
                self.result.is_some()
                    && self.error.is_none()
                    && self.completed_at.is_some_and(|at| at >= self.created_at)
            }
            JobStatus::Failed => self.error.is_some() && self.result.is_none(),
            JobStatus::Pending | JobStatus::Processing => {
                self.error.is_none() && self.result.is_none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn video() -> VideoResult {
        VideoResult::new("https://example.com/v.mp4", "video/mp4", Bytes::from_static(b"mp4"))
    }

    #[test]
    fn test_job_creation() {
        let job = Job::new("cat on a skateboard");

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.prompt, "cat on a skateboard");
        assert_eq!(job.attempts, 0);
        assert!(job.is_consistent());
    }

    #[test]
    fn test_job_state_transitions() {
        let mut job = Job::new("in the rain");

        job.apply(JobUpdate::Started).unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.started_at.is_some());
        assert_eq!(job.attempts, 1);

        job.apply(JobUpdate::Completed(video())).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.completed_at.unwrap() >= job.created_at);
        assert!(job.is_consistent());
    }

    #[test]
    fn test_job_retry_clears_error() {
        let mut job = Job::new("in the rain");
        job.apply(JobUpdate::Started).unwrap();
        job.apply(JobUpdate::Failed("quota exceeded".into())).unwrap();
        assert_eq!(job.error.as_deref(), Some("quota exceeded"));
        assert!(job.is_consistent());

        job.apply(JobUpdate::Retried).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.error.is_none());
        assert_eq!(job.prompt, "in the rain");
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut job = Job::new("prompt");

        let err = job.apply(JobUpdate::Retried).unwrap_err();
        assert_eq!(err.from, JobStatus::Pending);
        assert_eq!(err.to_string(), "Cannot retry a job that is pending");

        assert!(job.apply(JobUpdate::Completed(video())).is_err());

        job.apply(JobUpdate::Started).unwrap();
        job.apply(JobUpdate::Completed(video())).unwrap();
        assert!(job.apply(JobUpdate::Retried).is_err());
        assert!(job.apply(JobUpdate::Started).is_err());
    }

    #[test]
    fn test_payload_not_serialized() {
        let mut job = Job::new("prompt");
        job.apply(JobUpdate::Started).unwrap();
        job.apply(JobUpdate::Completed(video())).unwrap();

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["result"]["uri"], "https://example.com/v.mp4");
        assert_eq!(value["result"]["size_bytes"], 3);
        assert!(value["result"].get("bytes").is_none());
        assert!(value.get("error").is_none());
    }
}

//! Queue metrics.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_ENQUEUED_TOTAL: &str = "vgen_jobs_enqueued_total";
    pub const JOBS_STARTED_TOTAL: &str = "vgen_jobs_started_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "vgen_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "vgen_jobs_failed_total";
    pub const JOBS_RETRIED_TOTAL: &str = "vgen_jobs_retried_total";
    pub const JOBS_IN_FLIGHT: &str = "vgen_jobs_in_flight";
    pub const GENERATION_DURATION_SECONDS: &str = "vgen_generation_duration_seconds";
    pub const SESSION_INVALIDATIONS_TOTAL: &str = "vgen_session_invalidations_total";
}

/// Reason label for failed jobs.
#[derive(Debug, Clone, Copy)]
pub enum FailureKind {
    Precondition,
    SessionInvalid,
    Generation,
    Panic,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Precondition => "precondition",
            FailureKind::SessionInvalid => "session_invalid",
            FailureKind::Generation => "generation",
            FailureKind::Panic => "panic",
        }
    }
}

pub fn record_jobs_enqueued(count: usize) {
    counter!(names::JOBS_ENQUEUED_TOTAL).increment(count as u64);
}

pub fn record_job_started() {
    counter!(names::JOBS_STARTED_TOTAL).increment(1);
    gauge!(names::JOBS_IN_FLIGHT).increment(1.0);
}

pub fn record_job_completed(duration_secs: f64) {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
    histogram!(names::GENERATION_DURATION_SECONDS).record(duration_secs);
    gauge!(names::JOBS_IN_FLIGHT).decrement(1.0);
}

pub fn record_job_failed(kind: FailureKind) {
    let labels = [("reason", kind.as_str().to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
    gauge!(names::JOBS_IN_FLIGHT).decrement(1.0);
}

pub fn record_job_retried() {
    counter!(names::JOBS_RETRIED_TOTAL).increment(1);
}

pub fn record_session_invalidated() {
    counter!(names::SESSION_INVALIDATIONS_TOTAL).increment(1);
}

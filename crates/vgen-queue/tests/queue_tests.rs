//! Queue behavior tests against a scripted generator.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{Notify, Semaphore};

use vgen_client::{ApiKeySelector, ClientError, ClientResult, VideoGenerator};
use vgen_models::{GenerationConfig, JobId, JobStatus, VideoResult};
use vgen_queue::{
    JobQueue, QueueConfig, QueueError, Readiness, GENERATION_PANICKED, MAX_CONCURRENT_JOBS,
    PRECONDITION_NOT_MET,
};

const WAIT: Duration = Duration::from_secs(5);

/// Generator whose outcome is decided by the prompt.
///
/// - `fail:<msg>` returns an operation error
/// - `gone` returns the session-invalid API error
/// - `panic` panics
/// - anything else succeeds
#[derive(Default)]
struct ScriptedGenerator {
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
    gate: Option<Arc<Semaphore>>,
    started: Arc<Notify>,
}

impl ScriptedGenerator {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> ClientResult<VideoResult> {
        self.calls.lock().unwrap().push(prompt.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(msg) = prompt.strip_prefix("fail:") {
            return Err(ClientError::operation(msg));
        }
        match prompt {
            "gone" => Err(ClientError::Api {
                status: 404,
                message: "Requested entity was not found.".to_string(),
            }),
            "panic" => panic!("generator exploded"),
            _ => Ok(VideoResult::new(
                format!("https://videos.test/{}", prompt),
                "video/mp4",
                Bytes::from_static(b"mp4"),
            )),
        }
    }
}

/// Readiness whose selection flow claims success without selecting anything.
#[derive(Default)]
struct OptimisticReadiness {
    ready: AtomicBool,
}

#[async_trait]
impl Readiness for OptimisticReadiness {
    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn request_selection(&self, _credential: Option<String>) -> bool {
        true
    }

    async fn invalidate(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }
}

fn connected_keys() -> Arc<ApiKeySelector> {
    Arc::new(ApiKeySelector::new(Some("test-key".to_string())))
}

fn queue_with(generator: Arc<ScriptedGenerator>, keys: Arc<ApiKeySelector>) -> JobQueue {
    JobQueue::new(generator, keys, QueueConfig::default())
}

async fn drained(queue: &JobQueue) {
    tokio::time::timeout(WAIT, queue.wait_idle())
        .await
        .expect("queue did not drain");
}

#[tokio::test]
async fn test_batch_creates_one_job_per_line() {
    let generator = Arc::new(ScriptedGenerator::default());
    let queue = queue_with(generator.clone(), Arc::new(ApiKeySelector::new(None)));

    let jobs = tokio_test::assert_ok!(queue.add_batch("cat on a skateboard\n\nin the rain").await);
    let prompts: Vec<_> = jobs.iter().map(|j| j.prompt.as_str()).collect();
    assert_eq!(prompts, vec!["cat on a skateboard", "in the rain"]);
    assert!(jobs.iter().all(|j| j.status == JobStatus::Pending));

    drained(&queue).await;
    assert_eq!(queue.jobs().await.len(), 2);
}

#[tokio::test]
async fn test_blank_batch_is_rejected() {
    let generator = Arc::new(ScriptedGenerator::default());
    let queue = queue_with(generator.clone(), connected_keys());

    let err = queue.add_batch("  \n\t\n").await.unwrap_err();
    assert!(matches!(err, QueueError::EmptyBatch));
    assert!(queue.jobs().await.is_empty());
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn test_jobs_complete_in_fifo_order_one_at_a_time() {
    let generator = Arc::new(ScriptedGenerator::with_delay(Duration::from_millis(10)));
    let queue = queue_with(generator.clone(), connected_keys());

    queue.add_batch("A\nB\nC").await.unwrap();
    drained(&queue).await;

    assert_eq!(generator.calls(), vec!["A", "B", "C"]);
    assert_eq!(generator.max_in_flight(), 1);

    let jobs = queue.jobs().await;
    assert!(jobs.iter().all(|j| j.status == JobStatus::Completed));
    assert!(jobs.iter().all(|j| j.is_consistent()));

    let completed: Vec<_> = jobs.iter().map(|j| j.completed_at.unwrap()).collect();
    assert!(completed.windows(2).all(|w| w[0] <= w[1]));
    for job in &jobs {
        assert!(job.completed_at.unwrap() >= job.created_at);
        let video = queue.video(&job.id).await.unwrap();
        assert_eq!(video.bytes, Bytes::from_static(b"mp4"));
    }
}

#[tokio::test]
async fn test_jobs_added_while_busy_are_picked_up() {
    let generator = Arc::new(ScriptedGenerator::with_delay(Duration::from_millis(20)));
    let queue = queue_with(generator.clone(), connected_keys());

    queue.add_batch("first").await.unwrap();
    tokio::time::timeout(WAIT, generator.started.notified())
        .await
        .unwrap();
    queue.add_batch("second").await.unwrap();

    drained(&queue).await;
    assert_eq!(generator.calls(), vec!["first", "second"]);
    assert_eq!(queue.stats().await.completed, 2);
}

#[tokio::test]
async fn test_at_most_one_job_processing() {
    let gate = Arc::new(Semaphore::new(0));
    let generator = Arc::new(ScriptedGenerator::gated(gate.clone()));
    let queue = queue_with(generator.clone(), connected_keys());

    queue.add_batch("a\nb\nc").await.unwrap();
    for _ in 0..3 {
        tokio::time::timeout(WAIT, generator.started.notified())
            .await
            .unwrap();
        let counts = queue.stats().await;
        assert_eq!(counts.processing, 1);
        assert!(!queue.is_idle());
        gate.add_permits(1);
    }

    drained(&queue).await;
    assert_eq!(queue.stats().await.processing, 0);
    assert!(queue.is_idle());
}

#[tokio::test]
async fn test_trigger_is_idempotent() {
    let generator = Arc::new(ScriptedGenerator::default());
    let queue = queue_with(generator.clone(), connected_keys());

    for _ in 0..5 {
        assert_eq!(queue.advance(), 0);
    }
    drained(&queue).await;
    assert!(generator.calls().is_empty());
    assert!(queue.jobs().await.is_empty());

    queue.add_batch("only").await.unwrap();
    drained(&queue).await;
    let before = queue.jobs().await;

    for _ in 0..5 {
        assert_eq!(queue.advance(), 0);
    }
    drained(&queue).await;

    assert_eq!(generator.calls().len(), 1);
    let after = queue.jobs().await;
    assert_eq!(before[0].status, after[0].status);
    assert_eq!(before[0].completed_at, after[0].completed_at);
}

#[tokio::test]
async fn test_trigger_while_busy_spawns_nothing() {
    let gate = Arc::new(Semaphore::new(0));
    let generator = Arc::new(ScriptedGenerator::gated(gate.clone()));
    let queue = queue_with(generator.clone(), connected_keys());

    queue.add_batch("slow").await.unwrap();
    tokio::time::timeout(WAIT, generator.started.notified())
        .await
        .unwrap();

    assert_eq!(queue.advance(), 0);

    gate.add_permits(1);
    drained(&queue).await;
    assert_eq!(generator.calls().len(), 1);
}

#[tokio::test]
async fn test_not_ready_fails_without_calling_client() {
    let generator = Arc::new(ScriptedGenerator::default());
    let queue = queue_with(generator.clone(), Arc::new(ApiKeySelector::new(None)));

    let jobs = queue.add_batch("a dog surfing").await.unwrap();
    drained(&queue).await;

    let job = queue.job(&jobs[0].id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some(PRECONDITION_NOT_MET));
    assert!(job.result.is_none());
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn test_session_invalid_clears_readiness() {
    let generator = Arc::new(ScriptedGenerator::default());
    let keys = connected_keys();
    let queue = queue_with(generator.clone(), keys.clone());

    let jobs = queue.add_batch("gone\nnext").await.unwrap();
    drained(&queue).await;

    let first = queue.job(&jobs[0].id).await.unwrap();
    assert_eq!(first.status, JobStatus::Failed);
    assert!(first
        .error
        .as_deref()
        .unwrap()
        .contains("Requested entity was not found."));
    assert!(!queue.is_ready().await);
    assert!(!keys.is_selected().await);

    let second = queue.job(&jobs[1].id).await.unwrap();
    assert_eq!(second.error.as_deref(), Some(PRECONDITION_NOT_MET));
    assert_eq!(generator.calls(), vec!["gone"]);
}

#[tokio::test]
async fn test_failure_does_not_stop_the_loop() {
    let generator = Arc::new(ScriptedGenerator::default());
    let queue = queue_with(generator.clone(), connected_keys());

    let jobs = queue
        .add_batch("fail:quota exceeded\npanic\nfine")
        .await
        .unwrap();
    drained(&queue).await;

    let failed = queue.job(&jobs[0].id).await.unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(
        failed.error.as_deref(),
        Some("Video generation failed: quota exceeded")
    );

    let panicked = queue.job(&jobs[1].id).await.unwrap();
    assert_eq!(panicked.error.as_deref(), Some(GENERATION_PANICKED));

    let fine = queue.job(&jobs[2].id).await.unwrap();
    assert_eq!(fine.status, JobStatus::Completed);
    assert!(queue.is_ready().await);
}

#[tokio::test]
async fn test_retry_requeues_failed_job() {
    let generator = Arc::new(ScriptedGenerator::default());
    let keys = Arc::new(ApiKeySelector::new(None));
    let queue = queue_with(generator.clone(), keys.clone());

    let jobs = queue.add_batch("sunset over dunes").await.unwrap();
    let id = jobs[0].id.clone();
    drained(&queue).await;
    assert_eq!(queue.job(&id).await.unwrap().status, JobStatus::Failed);

    queue.connect(Some("new-key".to_string())).await.unwrap();
    let retried = queue.retry(&id).await.unwrap();
    assert_eq!(retried.status, JobStatus::Pending);
    assert!(retried.error.is_none());

    drained(&queue).await;
    let job = queue.job(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.prompt, "sunset over dunes");
    assert_eq!(job.attempts, 2);
    assert_eq!(generator.calls(), vec!["sunset over dunes"]);
}

#[tokio::test]
async fn test_retry_rejects_non_failed_and_unknown_jobs() {
    let generator = Arc::new(ScriptedGenerator::default());
    let queue = queue_with(generator.clone(), connected_keys());

    let jobs = queue.add_batch("ok").await.unwrap();
    drained(&queue).await;

    let err = queue.retry(&jobs[0].id).await.unwrap_err();
    assert!(matches!(err, QueueError::InvalidTransition(_)));

    let err = queue.retry(&JobId::new()).await.unwrap_err();
    assert!(matches!(err, QueueError::JobNotFound(_)));
}

#[tokio::test]
async fn test_delete_while_processing_discards_result() {
    let gate = Arc::new(Semaphore::new(0));
    let generator = Arc::new(ScriptedGenerator::gated(gate.clone()));
    let queue = queue_with(generator.clone(), connected_keys());

    let jobs = queue.add_batch("doomed\nsurvivor").await.unwrap();
    tokio::time::timeout(WAIT, generator.started.notified())
        .await
        .unwrap();

    let removed = queue.delete(&jobs[0].id).await.unwrap();
    assert_eq!(removed.status, JobStatus::Processing);

    gate.add_permits(2);
    drained(&queue).await;

    assert!(matches!(
        queue.job(&jobs[0].id).await,
        Err(QueueError::JobNotFound(_))
    ));
    let remaining = queue.jobs().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].status, JobStatus::Completed);
}

#[tokio::test]
async fn test_delete_while_processing_discards_failure() {
    let gate = Arc::new(Semaphore::new(0));
    let generator = Arc::new(ScriptedGenerator::gated(gate.clone()));
    let queue = queue_with(generator.clone(), connected_keys());

    let jobs = queue.add_batch("fail:late error\nsurvivor").await.unwrap();
    tokio::time::timeout(WAIT, generator.started.notified())
        .await
        .unwrap();

    queue.delete(&jobs[0].id).await.unwrap();
    gate.add_permits(2);
    drained(&queue).await;

    assert!(queue.job(&jobs[0].id).await.is_err());
    let remaining = queue.jobs().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, jobs[1].id);
    assert_eq!(remaining[0].status, JobStatus::Completed);
    assert_eq!(generator.calls(), vec!["fail:late error", "survivor"]);
}

#[tokio::test]
async fn test_delete_while_processing_session_error_still_invalidates() {
    let gate = Arc::new(Semaphore::new(0));
    let generator = Arc::new(ScriptedGenerator::gated(gate.clone()));
    let queue = queue_with(generator.clone(), connected_keys());

    let jobs = queue.add_batch("gone").await.unwrap();
    tokio::time::timeout(WAIT, generator.started.notified())
        .await
        .unwrap();

    queue.delete(&jobs[0].id).await.unwrap();
    gate.add_permits(1);
    drained(&queue).await;

    assert!(queue.jobs().await.is_empty());
    assert!(!queue.is_ready().await);
}

#[tokio::test]
async fn test_clear_while_processing() {
    let gate = Arc::new(Semaphore::new(0));
    let generator = Arc::new(ScriptedGenerator::gated(gate.clone()));
    let queue = queue_with(generator.clone(), connected_keys());

    queue.add_batch("running\nwaiting").await.unwrap();
    tokio::time::timeout(WAIT, generator.started.notified())
        .await
        .unwrap();
    assert_eq!(queue.stats().await.processing, 1);

    assert_eq!(queue.clear().await, 2);
    gate.add_permits(1);
    drained(&queue).await;

    assert!(queue.jobs().await.is_empty());
    assert_eq!(queue.stats().await.total(), 0);
    assert_eq!(generator.calls(), vec!["running"]);
    assert!(queue.is_idle());
}

#[tokio::test]
async fn test_oversized_concurrency_is_bounded() {
    let generator = Arc::new(ScriptedGenerator::with_delay(Duration::from_millis(5)));
    let queue = JobQueue::new(
        generator.clone(),
        connected_keys(),
        QueueConfig {
            max_concurrent_jobs: usize::MAX,
            ..Default::default()
        },
    );

    queue.add_batch("a\nb\nc").await.unwrap();
    assert!(queue.advance() <= MAX_CONCURRENT_JOBS);
    drained(&queue).await;

    assert_eq!(queue.stats().await.completed, 3);
    assert!(generator.max_in_flight() <= 3);
}

#[tokio::test]
async fn test_clear_removes_everything() {
    let generator = Arc::new(ScriptedGenerator::default());
    let queue = queue_with(generator, connected_keys());

    queue.add_batch("a\nb").await.unwrap();
    drained(&queue).await;

    assert_eq!(queue.clear().await, 2);
    assert!(queue.jobs().await.is_empty());
    assert_eq!(queue.stats().await.total(), 0);
}

#[tokio::test]
async fn test_video_of_unfinished_job() {
    let generator = Arc::new(ScriptedGenerator::default());
    let queue = queue_with(generator, Arc::new(ApiKeySelector::new(None)));

    let jobs = queue.add_batch("never").await.unwrap();
    drained(&queue).await;

    let err = queue.video(&jobs[0].id).await.unwrap_err();
    assert!(matches!(err, QueueError::NoVideo(_)));
}

#[tokio::test]
async fn test_connect_rechecks_readiness() {
    let generator = Arc::new(ScriptedGenerator::default());
    let queue = JobQueue::new(
        generator,
        Arc::new(OptimisticReadiness::default()),
        QueueConfig::default(),
    );

    let err = queue.connect(None).await.unwrap_err();
    assert!(matches!(err, QueueError::NotConnected(_)));
}

#[tokio::test]
async fn test_connect_without_key_fails() {
    let generator = Arc::new(ScriptedGenerator::default());
    let queue = queue_with(generator, Arc::new(ApiKeySelector::new(None)));

    assert!(queue.connect(None).await.is_err());
    assert!(queue.connect(Some("  ".to_string())).await.is_err());
    assert!(queue.connect(Some("key".to_string())).await.is_ok());
    assert!(queue.is_ready().await);

    queue.disconnect().await;
    assert!(!queue.is_ready().await);
}

#[tokio::test]
async fn test_bounded_parallelism() {
    let generator = Arc::new(ScriptedGenerator::with_delay(Duration::from_millis(20)));
    let queue = JobQueue::new(
        generator.clone(),
        connected_keys(),
        QueueConfig::default().with_max_concurrent_jobs(2),
    );

    queue.add_batch("a\nb\nc\nd").await.unwrap();
    drained(&queue).await;

    assert!(generator.max_in_flight() <= 2);
    assert_eq!(generator.calls().len(), 4);
    assert_eq!(queue.stats().await.completed, 4);
}

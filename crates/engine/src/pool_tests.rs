use super::*;
use quaero_core::{FakeClock, Job, JobConfig, JobKind, JobStatus, QueueConfig, QueueMessage};
use quaero_storage::Store;
use std::sync::Arc;
use tempfile::tempdir;

use crate::processor::{Processor, ProcessorContext, ProcessorOutcome};
use crate::registry::ProcessorRegistry;

fn open_store() -> (tempfile::TempDir, Arc<Store<FakeClock>>) {
    let dir = tempdir().unwrap_or_else(|e| panic!("{e}"));
    let store = Store::open(dir.path().join("test.wal"), FakeClock::new()).unwrap_or_else(|e| panic!("{e}"));
    (dir, Arc::new(store))
}

fn no_op_sink() -> LogSink {
    let (tx, _rx) = tokio::sync::mpsc::channel(1);
    LogSink { tx }
}

fn worker(store: Arc<Store<FakeClock>>, registry: Arc<ProcessorRegistry<FakeClock>>, max_receive: u32) -> Worker<FakeClock> {
    Worker {
        id: 0,
        store,
        registry,
        logs: no_op_sink(),
        clock: FakeClock::new(),
        config: QueueConfig {
            max_receive,
            ..QueueConfig::default()
        },
        cancellation: CancellationToken::new(),
    }
}

struct SucceedingProcessor;

#[async_trait::async_trait]
impl Processor<FakeClock> for SucceedingProcessor {
    fn kind(&self) -> JobKind {
        JobKind::CrawlerUrl
    }

    async fn validate(&self, _job: &Job) -> Result<(), String> {
        Ok(())
    }

    async fn execute(&self, _ctx: ProcessorContext<FakeClock>, _job: &Job) -> Result<ProcessorOutcome, String> {
        Ok(ProcessorOutcome::with_result(serde_json::json!({ "ok": true })))
    }
}

struct AlwaysFailsProcessor;

#[async_trait::async_trait]
impl Processor<FakeClock> for AlwaysFailsProcessor {
    fn kind(&self) -> JobKind {
        JobKind::CrawlerUrl
    }

    async fn validate(&self, _job: &Job) -> Result<(), String> {
        Ok(())
    }

    async fn execute(&self, _ctx: ProcessorContext<FakeClock>, _job: &Job) -> Result<ProcessorOutcome, String> {
        Err("fetch timed out".to_string())
    }
}

struct RejectsValidationProcessor;

#[async_trait::async_trait]
impl Processor<FakeClock> for RejectsValidationProcessor {
    fn kind(&self) -> JobKind {
        JobKind::CrawlerUrl
    }

    async fn validate(&self, _job: &Job) -> Result<(), String> {
        Err("missing url".to_string())
    }

    async fn execute(&self, _ctx: ProcessorContext<FakeClock>, _job: &Job) -> Result<ProcessorOutcome, String> {
        unreachable!("validate already rejected this job")
    }
}

fn seed_job_and_message(store: &Store<FakeClock>, kind: JobKind) -> Job {
    let config = JobConfig::builder(kind).source_type("web").entity_type("document").build();
    let job = store.create_job(config).unwrap_or_else(|e| panic!("{e}"));
    let message = QueueMessage::new(job.id, job.parent_id, kind, serde_json::json!({}));
    store.enqueue(message, std::time::Duration::ZERO).unwrap_or_else(|e| panic!("{e}"));
    job
}

#[tokio::test]
async fn tick_with_an_empty_queue_is_a_no_op() {
    let (_dir, store) = open_store();
    let registry = Arc::new(ProcessorRegistry::new());
    let worker = worker(store, registry, 3);
    worker.tick().await;
}

#[tokio::test]
async fn tick_completes_a_job_whose_processor_succeeds() {
    let (_dir, store) = open_store();
    let mut registry = ProcessorRegistry::new();
    registry.register(Arc::new(SucceedingProcessor)).unwrap_or_else(|e| panic!("{e}"));
    let job = seed_job_and_message(&store, JobKind::CrawlerUrl);

    let worker = worker(Arc::clone(&store), Arc::new(registry), 3);
    worker.tick().await;

    let updated = store.get_job(job.id.as_str()).unwrap_or_else(|| panic!("job missing"));
    assert_eq!(updated.status, JobStatus::Completed);
    assert_eq!(updated.result, Some(serde_json::json!({ "ok": true })));
    assert_eq!(store.queue_length(), 0);
}

#[tokio::test]
async fn tick_fails_a_job_immediately_when_validation_rejects_it() {
    let (_dir, store) = open_store();
    let mut registry = ProcessorRegistry::new();
    registry.register(Arc::new(RejectsValidationProcessor)).unwrap_or_else(|e| panic!("{e}"));
    let job = seed_job_and_message(&store, JobKind::CrawlerUrl);

    let worker = worker(Arc::clone(&store), Arc::new(registry), 3);
    worker.tick().await;

    let updated = store.get_job(job.id.as_str()).unwrap_or_else(|| panic!("job missing"));
    assert_eq!(updated.status, JobStatus::Failed);
    assert!(updated.error.as_deref().unwrap_or_default().starts_with("Validation:"));
    assert_eq!(store.queue_length(), 0);
}

#[tokio::test]
async fn tick_releases_a_failed_job_for_retry_below_max_receive() {
    let (_dir, store) = open_store();
    let mut registry = ProcessorRegistry::new();
    registry.register(Arc::new(AlwaysFailsProcessor)).unwrap_or_else(|e| panic!("{e}"));
    let job = seed_job_and_message(&store, JobKind::CrawlerUrl);

    let worker = worker(Arc::clone(&store), Arc::new(registry), 3);
    worker.tick().await;

    let updated = store.get_job(job.id.as_str()).unwrap_or_else(|| panic!("job missing"));
    assert_eq!(updated.status, JobStatus::Pending);
    assert_eq!(store.queue_length(), 1);
}

#[tokio::test]
async fn tick_dead_letters_a_failed_job_once_max_receive_is_exhausted() {
    let (_dir, store) = open_store();
    let mut registry = ProcessorRegistry::new();
    registry.register(Arc::new(AlwaysFailsProcessor)).unwrap_or_else(|e| panic!("{e}"));
    let job = seed_job_and_message(&store, JobKind::CrawlerUrl);

    let worker = worker(Arc::clone(&store), Arc::new(registry), 1);
    worker.tick().await;

    let updated = store.get_job(job.id.as_str()).unwrap_or_else(|| panic!("job missing"));
    assert_eq!(updated.status, JobStatus::Failed);
    assert_eq!(store.queue_length(), 0);
}

#[tokio::test]
async fn tick_fails_a_job_immediately_when_no_processor_is_registered() {
    let (_dir, store) = open_store();
    let registry = Arc::new(ProcessorRegistry::new());
    let job = seed_job_and_message(&store, JobKind::Summarizer);

    let worker = worker(Arc::clone(&store), registry, 3);
    worker.tick().await;

    let updated = store.get_job(job.id.as_str()).unwrap_or_else(|| panic!("job missing"));
    assert_eq!(updated.status, JobStatus::Failed);
    assert_eq!(store.queue_length(), 0);
}

use super::*;
use quaero_core::FakeClock;
use quaero_storage::Store;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

struct EchoProcessor;

#[async_trait::async_trait]
impl Processor<FakeClock> for EchoProcessor {
    fn kind(&self) -> JobKind {
        JobKind::CrawlerUrl
    }

    async fn validate(&self, job: &Job) -> Result<(), String> {
        if job.config.get("url").is_some() {
            Ok(())
        } else {
            Err("Validation: missing url".to_string())
        }
    }

    async fn execute(&self, _ctx: ProcessorContext<FakeClock>, job: &Job) -> Result<ProcessorOutcome, String> {
        Ok(ProcessorOutcome::with_result(job.config.clone()))
    }
}

fn context() -> (tempfile::TempDir, ProcessorContext<FakeClock>) {
    let dir = tempdir().unwrap_or_else(|e| panic!("{e}"));
    let store = Arc::new(Store::open(dir.path().join("test.wal"), FakeClock::new()).unwrap_or_else(|e| panic!("{e}")));
    let (tx, _rx) = tokio::sync::mpsc::channel(1);
    let ctx = ProcessorContext {
        store,
        logs: crate::log_pipeline::LogSink { tx },
        cancellation: CancellationToken::new(),
        clock: FakeClock::new(),
    };
    (dir, ctx)
}

#[tokio::test]
async fn validate_rejects_jobs_missing_required_config() {
    let (_dir, _ctx) = context();
    let job = Job::new(
        quaero_core::JobConfig::builder(JobKind::CrawlerUrl)
            .source_type("web")
            .entity_type("document")
            .build(),
        1_000,
    );
    let processor = EchoProcessor;
    assert!(processor.validate(&job).await.is_err());
}

#[tokio::test]
async fn execute_echoes_config_as_result() {
    let (_dir, ctx) = context();
    let config = serde_json::json!({"url": "http://a"});
    let job = Job::new(
        quaero_core::JobConfig::builder(JobKind::CrawlerUrl)
            .source_type("web")
            .entity_type("document")
            .config(config.clone())
            .build(),
        1_000,
    );
    let processor = EchoProcessor;
    let outcome = processor.execute(ctx, &job).await.unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(outcome.result, Some(config));
}

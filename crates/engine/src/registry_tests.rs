use super::*;
use quaero_core::{FakeClock, Job, JobKind};
use std::sync::Arc;

struct StubProcessor(JobKind);

#[async_trait::async_trait]
impl crate::processor::Processor<FakeClock> for StubProcessor {
    fn kind(&self) -> JobKind {
        self.0
    }

    async fn validate(&self, _job: &Job) -> Result<(), String> {
        Ok(())
    }

    async fn execute(
        &self,
        _ctx: crate::processor::ProcessorContext<FakeClock>,
        _job: &Job,
    ) -> Result<crate::processor::ProcessorOutcome, String> {
        Ok(crate::processor::ProcessorOutcome::with_result(serde_json::Value::Null))
    }
}

struct StubStepExecutor(&'static str);

#[async_trait::async_trait]
impl crate::step_executor::StepExecutor<FakeClock> for StubStepExecutor {
    fn action(&self) -> &'static str {
        self.0
    }

    async fn expand(&self, _ctx: &crate::step_executor::StepContext<FakeClock>) -> Result<Vec<quaero_core::JobId>, String> {
        Ok(Vec::new())
    }
}

#[test]
fn processor_registry_rejects_duplicate_kinds() {
    let mut registry = ProcessorRegistry::<FakeClock>::new();
    registry
        .register(Arc::new(StubProcessor(JobKind::CrawlerUrl)))
        .unwrap_or_else(|e| panic!("{e}"));

    let err = registry.register(Arc::new(StubProcessor(JobKind::CrawlerUrl))).unwrap_err();
    assert!(matches!(err, EngineError::DuplicateProcessor(JobKind::CrawlerUrl)));
}

#[test]
fn processor_registry_looks_up_by_kind() {
    let mut registry = ProcessorRegistry::<FakeClock>::new();
    registry
        .register(Arc::new(StubProcessor(JobKind::Agent)))
        .unwrap_or_else(|e| panic!("{e}"));

    assert!(registry.get(JobKind::Agent).is_some());
    assert!(registry.get(JobKind::Summarizer).is_none());
}

#[test]
fn step_executor_registry_rejects_duplicate_actions() {
    let mut registry = StepExecutorRegistry::<FakeClock>::new();
    registry
        .register(Arc::new(StubStepExecutor("crawl")))
        .unwrap_or_else(|e| panic!("{e}"));

    let err = registry.register(Arc::new(StubStepExecutor("crawl"))).unwrap_err();
    assert!(matches!(err, EngineError::DuplicateStepExecutor(action) if action == "crawl"));
}

#[test]
fn step_executor_registry_looks_up_by_action() {
    let mut registry = StepExecutorRegistry::<FakeClock>::new();
    registry
        .register(Arc::new(StubStepExecutor("crawl")))
        .unwrap_or_else(|e| panic!("{e}"));

    assert!(registry.get("crawl").is_some());
    assert!(registry.get("summarize").is_none());
}

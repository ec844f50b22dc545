//! Test-fixture processor for `summarizer` jobs. Same stand-in role as
//! [`crate::builtin::AgentProcessor`], for the `summarize` step action.

use async_trait::async_trait;
use quaero_core::{Clock, Job, JobKind};

use crate::processor::{Processor, ProcessorContext, ProcessorOutcome};

pub struct SummarizerProcessor;

#[async_trait]
impl<C: Clock> Processor<C> for SummarizerProcessor {
    fn kind(&self) -> JobKind {
        JobKind::Summarizer
    }

    async fn validate(&self, job: &Job) -> Result<(), String> {
        if job.config.get("document_id").and_then(|v| v.as_str()).is_some() {
            Ok(())
        } else {
            Err("job config is missing a \"document_id\" string".to_string())
        }
    }

    async fn execute(
        &self,
        _ctx: ProcessorContext<C>,
        _job: &Job,
    ) -> Result<ProcessorOutcome, String> {
        Ok(ProcessorOutcome::with_result(serde_json::json!({
            "summarizer": { "stub": true },
        })))
    }
}

#[cfg(test)]
#[path = "summarizer_processor_tests.rs"]
mod tests;

//! Test-fixture processor for `crawler_url` jobs. Validates that the job
//! carries a `url` string and otherwise completes immediately — actual
//! HTTP/HTML fetching is an external collaborator, out of scope here.

use async_trait::async_trait;
use quaero_core::{ensure_categorized, Clock, ErrorCategory, Job, JobKind};

use crate::processor::{Processor, ProcessorContext, ProcessorOutcome};

pub struct CrawlerUrlProcessor;

#[async_trait]
impl<C: Clock> Processor<C> for CrawlerUrlProcessor {
    fn kind(&self) -> JobKind {
        JobKind::CrawlerUrl
    }

    async fn validate(&self, job: &Job) -> Result<(), String> {
        match job.config.get("url").and_then(|v| v.as_str()) {
            Some(url) if !url.is_empty() => Ok(()),
            _ => Err("job config is missing a non-empty \"url\" string".to_string()),
        }
    }

    async fn execute(
        &self,
        _ctx: ProcessorContext<C>,
        job: &Job,
    ) -> Result<ProcessorOutcome, String> {
        let url = job
            .config
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ensure_categorized(ErrorCategory::System, "missing url at execute time"))?;
        Ok(ProcessorOutcome::with_result(serde_json::json!({
            "url": url,
            "fetched": true,
        })))
    }
}

#[cfg(test)]
#[path = "crawler_url_processor_tests.rs"]
mod tests;

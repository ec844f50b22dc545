//! The `crawl` step executor (spec 4.E, scenario 1 in spec section 8):
//! expands `{ seed_urls: [...] }` into one `crawler_url` child per
//! not-yet-seen URL, deduping via `MarkURLSeen` as it goes.

use async_trait::async_trait;
use quaero_core::{Clock, JobConfig, JobId, JobKind, QueueMessage};
use std::time::Duration;

use crate::step_executor::{StepContext, StepExecutor};

pub struct CrawlStepExecutor;

#[async_trait]
impl<C: Clock> StepExecutor<C> for CrawlStepExecutor {
    fn action(&self) -> &'static str {
        "crawl"
    }

    async fn expand(&self, ctx: &StepContext<C>) -> Result<Vec<JobId>, String> {
        let parent = ctx
            .store
            .get_job(ctx.parent_id.as_str())
            .ok_or_else(|| "parent job not found".to_string())?;

        let seed_urls: Vec<String> = ctx
            .step
            .config
            .get("seed_urls")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        if seed_urls.is_empty() {
            return Err("step config is missing a non-empty \"seed_urls\" array".to_string());
        }

        let mut created = Vec::with_capacity(seed_urls.len());
        for url in seed_urls {
            let newly_seen = ctx
                .store
                .mark_url_seen(ctx.parent_id, &url)
                .map_err(|error| format!("Storage: {error}"))?;
            if !newly_seen {
                continue;
            }

            let config = JobConfig::builder(JobKind::CrawlerUrl)
                .parent_id(ctx.parent_id)
                .source_type(parent.source_type.clone())
                .entity_type(parent.entity_type.clone())
                .config(serde_json::json!({ "url": url }))
                .build();
            let child = ctx.store.create_job(config).map_err(|error| format!("Storage: {error}"))?;

            let message = QueueMessage::new(child.id, ctx.parent_id, JobKind::CrawlerUrl, serde_json::json!(url));
            ctx.store
                .enqueue(message, Duration::ZERO)
                .map_err(|error| format!("Storage: {error}"))?;
            created.push(child.id);
        }

        Ok(created)
    }
}

#[cfg(test)]
#[path = "crawl_step_executor_tests.rs"]
mod tests;

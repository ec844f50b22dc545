//! Test-fixture processor for `agent` jobs. Stands in for a real AI
//! model client (explicitly out of scope, spec section 1): records that
//! the agent ran and writes a stub result under the agent type's key, the
//! same metadata-channel convention a real agent step would use (spec
//! 4.E point 5).

use async_trait::async_trait;
use quaero_core::{Clock, Job, JobKind};

use crate::processor::{Processor, ProcessorContext, ProcessorOutcome};

pub struct AgentProcessor;

#[async_trait]
impl<C: Clock> Processor<C> for AgentProcessor {
    fn kind(&self) -> JobKind {
        JobKind::Agent
    }

    async fn validate(&self, job: &Job) -> Result<(), String> {
        match job.config.get("agent_type").and_then(|v| v.as_str()) {
            Some(agent_type) if !agent_type.is_empty() => Ok(()),
            _ => Err("job config is missing a non-empty \"agent_type\" string".to_string()),
        }
    }

    async fn execute(
        &self,
        _ctx: ProcessorContext<C>,
        job: &Job,
    ) -> Result<ProcessorOutcome, String> {
        let agent_type = job
            .config
            .get("agent_type")
            .and_then(|v| v.as_str())
            .unwrap_or("agent");
        let mut result = serde_json::Map::new();
        result.insert(agent_type.to_string(), serde_json::json!({ "stub": true }));
        Ok(ProcessorOutcome::with_result(serde_json::Value::Object(result)))
    }
}

#[cfg(test)]
#[path = "agent_processor_tests.rs"]
mod tests;

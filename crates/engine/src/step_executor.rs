//! The step executor interface (spec 4.E): one per job-definition
//! `action`, responsible for determining a step's input set and creating
//! + enqueueing one child job per input item.

use async_trait::async_trait;
use quaero_core::{Clock, JobId};
use std::sync::Arc;

use crate::job_definition::Step;

/// What a [`StepExecutor`] needs to expand a step: the parent job id
/// children should point at, the step's own config, and the store to
/// create and enqueue them with.
pub struct StepContext<C: Clock> {
    pub store: Arc<quaero_storage::Store<C>>,
    pub parent_id: JobId,
    pub step: Step,
}

/// Step executors create child jobs and enqueue their messages; they do
/// not wait on them. Waiting is the outer [`crate::executor::JobDefinitionExecutor`]'s
/// job, polling child-stats on `parent_id`.
#[async_trait]
pub trait StepExecutor<C: Clock>: Send + Sync {
    fn action(&self) -> &'static str;

    /// Determine the input set, create a child job + enqueue a message
    /// for each item, and return the created child ids.
    async fn expand(&self, ctx: &StepContext<C>) -> Result<Vec<JobId>, String>;
}

#[cfg(test)]
#[path = "step_executor_tests.rs"]
mod tests;

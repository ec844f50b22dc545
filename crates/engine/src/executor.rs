//! The job-definition executor (spec 4.E): runs a declarative multi-step
//! job strictly sequentially, expanding each step into concurrent child
//! jobs and aggregating their outcome before moving to the next step.

use quaero_core::{Clock, JobConfig, JobId, JobKind, JobStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use quaero_storage::Store;

use crate::error::EngineError;
use crate::job_definition::{JobDefinition, OnError};
use crate::registry::StepExecutorRegistry;
use crate::step_executor::StepContext;

/// How often the executor re-checks a step's child-stats while waiting
/// for it to close out (spec 4.E point 3: "the outer executor polls the
/// root parent's child-stats until all children are terminal or the
/// declared timeout elapses").
const POLL_INTERVAL: Duration = Duration::from_millis(500);

const CANCELLED_BY_PARENT_ERROR: &str = "Cancelled by parent job error tolerance threshold";

pub struct JobDefinitionExecutor<C: Clock> {
    store: Arc<Store<C>>,
    step_executors: Arc<StepExecutorRegistry<C>>,
    clock: C,
}

impl<C: Clock> JobDefinitionExecutor<C> {
    pub fn new(store: Arc<Store<C>>, step_executors: Arc<StepExecutorRegistry<C>>, clock: C) -> Self {
        Self {
            store,
            step_executors,
            clock,
        }
    }

    /// Create the root parent job and run every step of `definition`
    /// against it in order, returning the parent's final job id.
    pub async fn run(
        &self,
        definition: &JobDefinition,
        source_type: &str,
        entity_type: &str,
        initial_config: serde_json::Value,
    ) -> Result<JobId, EngineError> {
        if definition.steps.is_empty() {
            return Err(EngineError::EmptyJobDefinition(definition.id.clone()));
        }

        let config = JobConfig::builder(JobKind::Parent)
            .source_type(source_type)
            .entity_type(entity_type)
            .job_definition_id(definition.id.clone())
            .config(initial_config)
            .build();
        let parent = self.store.create_job(config)?;
        self.store.update_job_status(parent.id, JobStatus::Running, None)?;

        let deadline = self.clock.now() + definition.timeout;
        self.run_steps_to_completion(parent.id, &definition.steps, deadline).await?;
        Ok(parent.id)
    }

    /// Like [`Self::run`], but returns as soon as the parent job exists,
    /// driving the step loop to completion in a detached task. For a
    /// caller (the daemon's request dispatcher) that needs the id back
    /// before the definition finishes running.
    pub async fn spawn(
        self: &Arc<Self>,
        definition: JobDefinition,
        source_type: &str,
        entity_type: &str,
        initial_config: serde_json::Value,
    ) -> Result<JobId, EngineError>
    where
        C: 'static,
    {
        if definition.steps.is_empty() {
            return Err(EngineError::EmptyJobDefinition(definition.id.clone()));
        }

        let config = JobConfig::builder(JobKind::Parent)
            .source_type(source_type)
            .entity_type(entity_type)
            .job_definition_id(definition.id.clone())
            .config(initial_config)
            .build();
        let parent = self.store.create_job(config)?;
        self.store.update_job_status(parent.id, JobStatus::Running, None)?;

        let deadline = self.clock.now() + definition.timeout;
        let executor = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = executor.run_steps_to_completion(parent.id, &definition.steps, deadline).await {
                error!(job_id = %parent.id, error = %err, "job definition failed after spawn");
            }
        });

        Ok(parent.id)
    }

    async fn run_steps_to_completion(
        &self,
        parent_id: JobId,
        steps: &[crate::job_definition::Step],
        deadline: std::time::Instant,
    ) -> Result<(), EngineError> {
        for step in steps {
            match self.run_step(parent_id, step, deadline).await {
                Ok(StepOutcome::Continue) => continue,
                Ok(StepOutcome::ParentFailed) => return Ok(()),
                Err(error) => {
                    warn!(job_id = %parent_id, step = %step.name, %error, "step executor error");
                    self.store.update_job_status(
                        parent_id,
                        JobStatus::Failed,
                        Some(format!("System: step {} failed: {error}", step.name)),
                    )?;
                    return Ok(());
                }
            }
        }

        self.store.update_job_status(parent_id, JobStatus::Completed, None)?;
        Ok(())
    }

    async fn run_step(
        &self,
        parent_id: JobId,
        step: &crate::job_definition::Step,
        deadline: std::time::Instant,
    ) -> Result<StepOutcome, EngineError> {
        let executor = self
            .step_executors
            .get(&step.action)
            .ok_or_else(|| EngineError::NoStepExecutor(step.action.clone()))?;

        let ctx = StepContext {
            store: Arc::clone(&self.store),
            parent_id,
            step: step.clone(),
        };
        let children = executor.expand(&ctx).await.map_err(|message| EngineError::StepExpansion {
            action: step.action.clone(),
            message,
        })?;

        self.store.reset_job_progress(parent_id, children.len() as u64)?;

        if children.is_empty() {
            return Ok(StepOutcome::Continue);
        }

        loop {
            let stats = self
                .store
                .get_job_child_stats(&[parent_id])
                .remove(&parent_id)
                .unwrap_or_default();

            if stats.all_terminal() {
                if stats.any_failed() && step.on_error == OnError::Fail {
                    self.store.update_job_status(
                        parent_id,
                        JobStatus::Failed,
                        Some(format!(
                            "System: step {} failed ({} of {} children failed)",
                            step.name,
                            stats.by_status.get(&JobStatus::Failed).copied().unwrap_or(0),
                            stats.total
                        )),
                    )?;
                    return Ok(StepOutcome::ParentFailed);
                }
                return Ok(StepOutcome::Continue);
            }

            if self.clock.now() >= deadline {
                let cancelled = self.store.stop_all_child_jobs(parent_id, CANCELLED_BY_PARENT_ERROR)?;
                info!(job_id = %parent_id, step = %step.name, cancelled, "step timed out, cancelling remaining children");
                self.store.update_job_status(
                    parent_id,
                    JobStatus::Failed,
                    Some(format!("Timeout: step {} exceeded its deadline", step.name)),
                )?;
                return Ok(StepOutcome::ParentFailed);
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

enum StepOutcome {
    Continue,
    ParentFailed,
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

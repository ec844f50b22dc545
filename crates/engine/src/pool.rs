//! The worker pool (spec 4.D): N poll loops over the durable queue, each
//! dispatching to a registered processor, plus a periodic stall sweeper.

use quaero_core::{ensure_categorized, truncate_for_display, Clock, ErrorCategory, JobStatus, QueueConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use quaero_storage::Store;

use crate::log_pipeline::LogSink;
use crate::processor::ProcessorContext;
use crate::registry::ProcessorRegistry;

/// How often [`WorkerPool::spawn`]'s stall sweeper wakes up (spec 4.D:
/// "a separate periodic task (every 5 min)").
const STALL_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

const STALL_ERROR: &str = "Timeout: No activity for 15+ minutes — check network connectivity, \
     increase timeout, or verify the job is not stuck";

/// N poll-loop tasks plus one stall-sweeper task, all cancellable from a
/// single token (spec 5: "one process-wide root context; shutdown
/// cancels it").
pub struct WorkerPool<C: Clock> {
    handles: Vec<JoinHandle<()>>,
    cancellation: CancellationToken,
    _marker: std::marker::PhantomData<C>,
}

impl<C: Clock> WorkerPool<C> {
    pub fn spawn(
        store: Arc<Store<C>>,
        registry: Arc<ProcessorRegistry<C>>,
        logs: LogSink,
        clock: C,
        config: QueueConfig,
        stall_threshold: Duration,
    ) -> Self {
        let cancellation = CancellationToken::new();
        let mut handles = Vec::with_capacity(config.concurrency + 1);

        for worker_id in 0..config.concurrency {
            let worker = Worker {
                id: worker_id,
                store: Arc::clone(&store),
                registry: Arc::clone(&registry),
                logs: logs.clone(),
                clock: clock.clone(),
                config: config.clone(),
                cancellation: cancellation.clone(),
            };
            handles.push(tokio::spawn(worker.run()));
        }

        handles.push(tokio::spawn(stall_sweeper(
            Arc::clone(&store),
            stall_threshold,
            cancellation.clone(),
        )));

        Self {
            handles,
            cancellation,
            _marker: std::marker::PhantomData,
        }
    }

    /// Trip cancellation and wait for every worker/sweeper task to
    /// observe it and return. In-flight messages are released, not
    /// deleted, by the worker that held them (spec 4.D cancellation).
    pub async fn shutdown(self) {
        self.cancellation.cancel();
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

struct Worker<C: Clock> {
    id: usize,
    store: Arc<Store<C>>,
    registry: Arc<ProcessorRegistry<C>>,
    logs: LogSink,
    clock: C,
    config: QueueConfig,
    cancellation: CancellationToken,
}

impl<C: Clock> Worker<C> {
    /// Runs each tick to completion even when cancellation fires mid-way:
    /// the pool must still reach the `release_message` call for whatever
    /// message this worker currently holds (spec 4.D cancellation). Only
    /// the idle "no message" wait is cancellation-interruptible, since it
    /// has no in-flight work to clean up.
    async fn run(self) {
        loop {
            if self.cancellation.is_cancelled() {
                return;
            }
            self.tick().await;
        }
    }

    async fn tick(&self) {
        let received = match self.store.receive(self.config.visibility_timeout, self.config.max_receive) {
            Ok(received) => received,
            Err(error) => {
                error!(worker = self.id, %error, "queue receive failed");
                self.sleep_poll_interval().await;
                return;
            }
        };

        let Some(received) = received else {
            self.sleep_poll_interval().await;
            return;
        };

        let message = received.message;
        let job_id = message.job_id;

        let Some(processor) = self.registry.get(message.kind) else {
            error!(worker = self.id, job_id = %job_id, kind = %message.kind, "no processor registered for job kind");
            let _ = self.store.delete_message(message.id);
            let _ = self.store.update_job_status(
                job_id,
                JobStatus::Failed,
                Some(ensure_categorized(ErrorCategory::System, &format!("no processor registered for kind {}", message.kind))),
            );
            return;
        };

        let Some(job) = self.store.get_job(job_id.as_str()) else {
            warn!(worker = self.id, job_id = %job_id, "message referenced a job that no longer exists");
            let _ = self.store.delete_message(message.id);
            return;
        };

        if let Err(validation_error) = processor.validate(&job).await {
            let _ = self.store.update_job_status(
                job_id,
                JobStatus::Failed,
                Some(ensure_categorized(ErrorCategory::Validation, &truncate_for_display(&validation_error))),
            );
            let _ = self.store.delete_message(message.id);
            return;
        }

        if let Err(error) = self.store.update_job_status(job_id, JobStatus::Running, None) {
            error!(worker = self.id, job_id = %job_id, %error, "failed to transition job to running");
            let _ = self.store.release_message(message.id);
            return;
        }
        let _ = self.store.heartbeat(job_id);

        let heartbeat_interval = self.config.visibility_timeout / 2;
        let heartbeat_store = Arc::clone(&self.store);
        let heartbeat_cancel = CancellationToken::new();
        let heartbeat_guard = heartbeat_cancel.clone();
        let heartbeat_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = heartbeat_guard.cancelled() => return,
                    _ = tokio::time::sleep(heartbeat_interval) => {
                        let _ = heartbeat_store.heartbeat(job_id);
                    }
                }
            }
        });

        let ctx = ProcessorContext {
            store: Arc::clone(&self.store),
            logs: self.logs.clone(),
            cancellation: self.cancellation.clone(),
            clock: self.clock.clone(),
        };
        let outcome = processor.execute(ctx, &job).await;

        heartbeat_cancel.cancel();
        let _ = heartbeat_task.await;

        if self.cancellation.is_cancelled() {
            let _ = self.store.release_message(message.id);
            return;
        }

        match outcome {
            Ok(outcome) => {
                if let Some(result) = outcome.result {
                    let _ = self.store.set_job_result(job_id, result);
                }
                let _ = self.store.update_job_status(job_id, JobStatus::Completed, None);
                if !job.parent_id.is_empty() {
                    let _ = self.store.update_progress_counters_atomic(job.parent_id, 1, 0);
                }
                let _ = self.store.delete_message(message.id);
            }
            Err(processor_error) => {
                let category_error = ensure_categorized(ErrorCategory::System, &truncate_for_display(&processor_error));
                if received.receive_count < self.config.max_receive {
                    let _ = self.store.update_job_status(job_id, JobStatus::Pending, Some(category_error));
                    let _ = self.store.release_message(message.id);
                } else {
                    let _ = self.store.update_job_status(job_id, JobStatus::Failed, Some(category_error));
                    if !job.parent_id.is_empty() {
                        let _ = self.store.update_progress_counters_atomic(job.parent_id, 0, 1);
                    }
                    let _ = self.store.delete_message(message.id);
                }
            }
        }
    }

    async fn sleep_poll_interval(&self) {
        tokio::select! {
            _ = self.cancellation.cancelled() => {}
            _ = tokio::time::sleep(self.config.poll_interval) => {}
        }
    }
}

/// `ListStaleJobs(15 min)`, run every five minutes (spec 4.D stall
/// detection): any `running` job whose heartbeat predates the threshold
/// is failed with the canonical stall message.
async fn stall_sweeper<C: Clock>(store: Arc<Store<C>>, threshold: Duration, cancellation: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancellation.cancelled() => return,
            _ = tokio::time::sleep(STALL_SWEEP_INTERVAL) => {
                let stale = store.list_stale_jobs(threshold);
                for job in stale {
                    info!(job_id = %job.id, "marking stalled job as failed");
                    if let Err(error) = store.update_job_status(job.id, JobStatus::Failed, Some(STALL_ERROR.to_string())) {
                        error!(job_id = %job.id, %error, "failed to fail stalled job");
                        continue;
                    }
                    if !job.parent_id.is_empty() {
                        let _ = store.update_progress_counters_atomic(job.parent_id, 0, 1);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;

//! Job lifecycle and progress event handlers.
//!
//! Handlers use assignment, not mutation, wherever the field is a simple
//! overwrite (`status`, `result`, `error`) so re-applying the same event
//! twice is harmless. `JobProgressDelta` is the one exception: it is an
//! additive counter update, relied on to be durably appended exactly
//! once per increment by the store above this layer.

use super::helpers;
use super::MaterializedState;
use quaero_core::{Event, Job, JobStatus};

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::JobCreated {
            config,
            created_at_epoch_ms,
        } => {
            let key = config.id.to_string();
            state
                .jobs
                .entry(key)
                .or_insert_with(|| Job::new(config.clone(), *created_at_epoch_ms));
        }

        Event::JobTotalSet { id, total } => {
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                if job.progress.total == 0 {
                    job.progress.total = *total;
                }
            }
        }

        Event::JobProgressReset { id, total } => {
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                job.progress.total = *total;
                job.progress.completed = 0;
                job.progress.failed = 0;
            }
        }

        Event::JobProgressDelta {
            id,
            delta_completed,
            delta_failed,
        } => {
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                job.progress.completed += delta_completed;
                job.progress.failed += delta_failed;
            }
        }

        Event::JobStatusChanged {
            id,
            status,
            error,
            at_epoch_ms,
        } => {
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                job.status = *status;
                if error.is_some() {
                    job.error.clone_from(error);
                }
                if *status == JobStatus::Running && job.started_at_epoch_ms.is_none() {
                    job.started_at_epoch_ms = Some(*at_epoch_ms);
                }
                if status.is_terminal() {
                    job.finished_at_epoch_ms = Some(*at_epoch_ms);
                }
            }
        }

        Event::JobResultSet { id, result } => {
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                job.result = Some(result.clone());
            }
        }

        Event::JobHeartbeat { id, at_epoch_ms } => {
            helpers::apply_if_not_terminal(&mut state.jobs, id.as_str(), |job| {
                job.last_heartbeat_epoch_ms = Some(
                    job.last_heartbeat_epoch_ms
                        .map_or(*at_epoch_ms, |existing| existing.max(*at_epoch_ms)),
                );
            });
        }

        Event::RunningJobsMarkedPending { ids, .. } => {
            for id in ids {
                if let Some(job) = state.jobs.get_mut(id.as_str()) {
                    if job.status == JobStatus::Running {
                        job.status = JobStatus::Pending;
                    }
                }
            }
        }

        Event::JobsDeleted { ids } => {
            for id in ids {
                state.jobs.remove(id.as_str());
                state.seen_urls.remove(id.as_str());
                state.logs.remove(id.as_str());
            }
            state
                .queue
                .retain(|_, record| !ids.iter().any(|id| id.as_str() == record.message.job_id.as_str()));
            state
                .dead_letters
                .retain(|_, message| !ids.iter().any(|id| id.as_str() == message.job_id.as_str()));
        }

        _ => {}
    }
}

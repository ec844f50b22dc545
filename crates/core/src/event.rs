//! The durable event log vocabulary.
//!
//! Every mutation the job store or durable queue makes is first expressed
//! as an `Event`, appended to the WAL (`quaero_storage::wal`), and only
//! then folded into the in-memory `MaterializedState`. This is the
//! at-rest data model's single writer discipline: events are facts,
//! state is derived.

use crate::job::{JobConfig, JobId, JobStatus};
use crate::log::LogRecord;
use crate::queue::{MessageId, QueueMessage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // --- Job Store (spec 4.B) ---
    JobCreated {
        config: JobConfig,
        created_at_epoch_ms: u64,
    },
    /// `total` is set exactly once; the store applies this only if the
    /// job's current total is still zero.
    JobTotalSet {
        id: JobId,
        total: u64,
    },
    /// Unconditional overwrite of `total`/`completed`/`failed` to
    /// `(total, 0, 0)`. Used only by the job-definition executor between
    /// steps of a multi-step job, where the root parent's progress
    /// re-bases to the step currently in flight rather than accumulating
    /// across the whole job (see DESIGN.md). `JobTotalSet` remains the
    /// single-step, set-once path used by scenario (1) in spec section 8.
    JobProgressReset {
        id: JobId,
        total: u64,
    },
    JobProgressDelta {
        id: JobId,
        delta_completed: u64,
        delta_failed: u64,
    },
    JobStatusChanged {
        id: JobId,
        status: JobStatus,
        error: Option<String>,
        at_epoch_ms: u64,
    },
    JobResultSet {
        id: JobId,
        result: serde_json::Value,
    },
    JobHeartbeat {
        id: JobId,
        at_epoch_ms: u64,
    },
    /// Startup recovery: every job found `running` is demoted to
    /// `pending` in a single event.
    RunningJobsMarkedPending {
        ids: Vec<JobId>,
        at_epoch_ms: u64,
    },
    /// Cascading delete: the store resolves the full set of affected ids
    /// (parent + children, depth-limited) before emitting this event, so
    /// application is a single atomic removal.
    JobsDeleted {
        ids: Vec<JobId>,
    },
    UrlSeen {
        job_id: JobId,
        url_hash: String,
    },

    // --- Durable Queue (spec 4.A) ---
    MessageEnqueued {
        message: QueueMessage,
        visible_at_epoch_ms: u64,
    },
    MessageReceived {
        id: MessageId,
        receive_count: u32,
        invisible_until_epoch_ms: u64,
    },
    MessageVisibilityExtended {
        id: MessageId,
        invisible_until_epoch_ms: u64,
    },
    MessageDeleted {
        id: MessageId,
    },
    /// Released back to visible (a processor failed but under
    /// `max_receive`, or the pool is shutting down mid-execution).
    MessageReleased {
        id: MessageId,
    },
    /// Dead-lettered: receive count exceeded `max_receive`.
    MessageDropped {
        id: MessageId,
    },

    // --- Log Pipeline (spec 4.C) ---
    LogsAppended {
        job_id: JobId,
        records: Vec<LogRecord>,
    },
}

impl Event {
    /// The job this event primarily concerns, if any — used for tracing
    /// spans and for log-summary formatting.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Event::JobCreated { config, .. } => Some(&config.id),
            Event::JobTotalSet { id, .. }
            | Event::JobProgressReset { id, .. }
            | Event::JobProgressDelta { id, .. }
            | Event::JobStatusChanged { id, .. }
            | Event::JobResultSet { id, .. }
            | Event::JobHeartbeat { id, .. }
            | Event::UrlSeen { job_id: id, .. } => Some(id),
            Event::LogsAppended { job_id, .. } => Some(job_id),
            Event::MessageEnqueued { message, .. } => Some(&message.job_id),
            _ => None,
        }
    }

    /// Used by the stall sweeper and tests: a short, greppable summary
    /// line, mirroring the teacher's per-event `log_summary` helpers.
    pub fn summary(&self) -> String {
        match self {
            Event::JobCreated { config, .. } => {
                format!("job_created id={} kind={}", config.id, config.kind)
            }
            Event::JobStatusChanged { id, status, .. } => {
                format!("job_status_changed id={id} status={status}")
            }
            Event::JobProgressDelta {
                id,
                delta_completed,
                delta_failed,
            } => format!(
                "job_progress_delta id={id} completed+={delta_completed} failed+={delta_failed}"
            ),
            Event::MessageEnqueued { message, .. } => {
                format!("message_enqueued id={} job={}", message.id, message.job_id)
            }
            Event::MessageDeleted { id } => format!("message_deleted id={id}"),
            Event::MessageReleased { id } => format!("message_released id={id}"),
            Event::MessageDropped { id } => format!("message_dropped id={id}"),
            Event::LogsAppended { job_id, records } => {
                format!("logs_appended job={job_id} count={}", records.len())
            }
            Event::JobsDeleted { ids } => format!("jobs_deleted count={}", ids.len()),
            Event::RunningJobsMarkedPending { ids, .. } => {
                format!("running_jobs_marked_pending count={}", ids.len())
            }
            Event::UrlSeen { job_id, url_hash } => {
                format!("url_seen job={job_id} hash={url_hash}")
            }
            Event::JobTotalSet { id, total } => format!("job_total_set id={id} total={total}"),
            Event::JobProgressReset { id, total } => {
                format!("job_progress_reset id={id} total={total}")
            }
            Event::JobResultSet { id, .. } => format!("job_result_set id={id}"),
            Event::JobHeartbeat { id, .. } => format!("job_heartbeat id={id}"),
            Event::MessageReceived {
                id, receive_count, ..
            } => format!("message_received id={id} receive_count={receive_count}"),
            Event::MessageVisibilityExtended { id, .. } => {
                format!("message_visibility_extended id={id}")
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

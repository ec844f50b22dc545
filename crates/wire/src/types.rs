//! Wire DTOs for jobs, progress, and log entries. Kept distinct from
//! `quaero_core::Job`/`DisplayLogEntry` so the on-disk/in-process shape
//! can evolve independently of what a caller across the wire sees.

use quaero_core::{DisplayLogEntry, Job, JobFilter, JobKind, JobStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
    pub pending: u64,
}

impl From<quaero_core::Progress> for ProgressSummary {
    fn from(p: quaero_core::Progress) -> Self {
        Self {
            total: p.total,
            completed: p.completed,
            failed: p.failed,
            pending: p.pending(),
        }
    }
}

/// Wire rendering of a [`Job`] (spec section 6 job-management API:
/// `ListJobs(filter) -> []Job`, `GetJob(id) -> Job`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub kind: String,
    pub parent_id: String,
    pub source_type: String,
    pub entity_type: String,
    pub status: String,
    pub progress: ProgressSummary,
    pub created_at_epoch_ms: u64,
    pub started_at_epoch_ms: Option<u64>,
    pub finished_at_epoch_ms: Option<u64>,
    /// Truncated to 200 characters for display (spec section 7); the
    /// full error remains on the stored [`Job`].
    pub error: Option<String>,
    pub result: Option<serde_json::Value>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.to_string(),
            kind: job.kind.to_string(),
            parent_id: job.parent_id.to_string(),
            source_type: job.source_type.clone(),
            entity_type: job.entity_type.clone(),
            status: job.status.to_string(),
            progress: job.progress.into(),
            created_at_epoch_ms: job.created_at_epoch_ms,
            started_at_epoch_ms: job.started_at_epoch_ms,
            finished_at_epoch_ms: job.finished_at_epoch_ms,
            error: job
                .error
                .as_deref()
                .map(quaero_core::truncate_for_display),
            result: job.result.clone(),
        }
    }
}

/// Wire rendering of a [`JobFilter`]. Statuses/kinds travel as their
/// `Display` strings (e.g. `"running"`, `"crawler_url"`) since the core
/// enums don't carry a wire-stable numeric discriminant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFilterWire {
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl JobFilterWire {
    /// Parse into the core [`JobFilter`]. Fails on an unrecognized
    /// status or kind string rather than silently dropping the filter.
    pub fn into_filter(self) -> Result<JobFilter, String> {
        let statuses = self
            .statuses
            .iter()
            .map(|s| parse_status(s))
            .collect::<Result<HashSet<JobStatus>, String>>()?;
        let kinds = self
            .kinds
            .iter()
            .map(|s| s.parse::<JobKind>().map_err(|e| e.to_string()))
            .collect::<Result<HashSet<JobKind>, String>>()?;
        Ok(JobFilter {
            parent_id: self.parent_id.map(quaero_core::JobId::from_string),
            statuses,
            kinds,
            source_type: self.source_type,
            offset: self.offset,
            limit: self.limit,
        })
    }
}

fn parse_status(s: &str) -> Result<JobStatus, String> {
    match s {
        "pending" => Ok(JobStatus::Pending),
        "running" => Ok(JobStatus::Running),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        "cancelled" => Ok(JobStatus::Cancelled),
        other => Err(format!("unknown job status: {other}")),
    }
}

/// Wire rendering of a [`DisplayLogEntry`] (spec section 4.C aggregated
/// read).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntryWire {
    pub job_id: String,
    pub sequence: u64,
    pub timestamp_epoch_ms: u64,
    pub display_time: String,
    pub level: String,
    pub message: String,
}

impl From<&DisplayLogEntry> for LogEntryWire {
    fn from(entry: &DisplayLogEntry) -> Self {
        Self {
            job_id: entry.job_id.to_string(),
            sequence: entry.sequence,
            timestamp_epoch_ms: entry.timestamp_epoch_ms,
            display_time: entry.display_time.clone(),
            level: entry.level.clone(),
            message: entry.message.clone(),
        }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

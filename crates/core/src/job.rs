//! Job identity, kind, status, and progress accounting.
//!
//! A [`Job`] is the unit the rest of the engine schedules and reports on.
//! Root jobs have an empty [`Job::parent_id`]; every child always points
//! directly at the root (the hierarchy is flat, never nested — see
//! [`Job::is_root`]).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

crate::define_id! {
    /// Unique identifier for a job instance.
    pub struct JobId("job-");
}

/// The kind of work a job performs. Exactly one [`crate::registry::Processor`]
/// is registered per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// A root job with no processor of its own; exists purely to track
    /// aggregate progress and logs for its children.
    Parent,
    PreValidation,
    CrawlerUrl,
    PostSummary,
    Agent,
    Cleanup,
    Summarizer,
}

crate::simple_display! {
    JobKind {
        Parent => "parent",
        PreValidation => "pre_validation",
        CrawlerUrl => "crawler_url",
        PostSummary => "post_summary",
        Agent => "agent",
        Cleanup => "cleanup",
        Summarizer => "summarizer",
    }
}

impl std::str::FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent" => Ok(Self::Parent),
            "pre_validation" => Ok(Self::PreValidation),
            "crawler_url" => Ok(Self::CrawlerUrl),
            "post_summary" => Ok(Self::PostSummary),
            "agent" => Ok(Self::Agent),
            "cleanup" => Ok(Self::Cleanup),
            "summarizer" => Ok(Self::Summarizer),
            other => Err(format!("unknown job kind: {other}")),
        }
    }
}

/// Job lifecycle state. `Pending -> Running -> {Completed, Failed,
/// Cancelled}`. `Running -> Pending` is allowed only via
/// [`crate::job::RECOVERY_TRANSITION`] (startup recovery); every other
/// transition out of a terminal state is rejected by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl JobStatus {
    /// Terminal statuses never re-enter a non-terminal state except via
    /// startup recovery (`running -> pending`), which is not a transition
    /// out of a terminal status in the first place.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether `self -> next` is a legal transition per the state machine
    /// in spec section 4.D. `allow_recovery` permits the one exception:
    /// `Running -> Pending` during `MarkRunningJobsAsPending`.
    pub fn can_transition_to(self, next: Self, allow_recovery: bool) -> bool {
        if self == next {
            return true; // idempotent re-application of the same status
        }
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (Self::Pending, Self::Running) => true,
            (Self::Pending, Self::Cancelled) => true,
            (Self::Running, Self::Completed | Self::Failed | Self::Cancelled) => true,
            (Self::Running, Self::Pending) => allow_recovery,
            _ => false,
        }
    }
}

/// Progress accounting for a job. `total` is set exactly once, at (or
/// immediately after) creation, by whichever caller determines the job's
/// input set; `completed` and `failed` only ever increase, via
/// `UpdateProgressCountersAtomic`. `pending` is always derived, never
/// stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
}

impl Progress {
    /// Derived: `total - completed - failed`, clamped at zero so a racing
    /// write can never make it appear negative.
    pub fn pending(&self) -> u64 {
        self.total
            .saturating_sub(self.completed)
            .saturating_sub(self.failed)
    }

    /// All declared work has reached a terminal per-item outcome.
    pub fn is_closed(&self) -> bool {
        self.total > 0 && self.completed + self.failed >= self.total
    }
}

/// Snapshot of a job's configuration at creation time. Config is opaque to
/// the core — each processor interprets its own schema — and is never
/// re-read from any external source after this point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub id: JobId,
    pub kind: JobKind,
    pub parent_id: JobId,
    pub job_definition_id: Option<String>,
    pub source_type: String,
    pub entity_type: String,
    pub config: serde_json::Value,
}

impl JobConfig {
    pub fn builder(kind: JobKind) -> JobConfigBuilder {
        JobConfigBuilder {
            id: JobId::new(),
            kind,
            parent_id: JobId::none(),
            job_definition_id: None,
            source_type: String::new(),
            entity_type: String::new(),
            config: serde_json::Value::Null,
        }
    }
}

pub struct JobConfigBuilder {
    id: JobId,
    kind: JobKind,
    parent_id: JobId,
    job_definition_id: Option<String>,
    source_type: String,
    entity_type: String,
    config: serde_json::Value,
}

impl JobConfigBuilder {
    crate::setters! {
        into {
            id: JobId,
            parent_id: JobId,
            source_type: String,
            entity_type: String,
        }
        set {
            config: serde_json::Value,
        }
        option {
            job_definition_id: String,
        }
    }

    pub fn build(self) -> JobConfig {
        JobConfig {
            id: self.id,
            kind: self.kind,
            parent_id: self.parent_id,
            job_definition_id: self.job_definition_id,
            source_type: self.source_type,
            entity_type: self.entity_type,
            config: self.config,
        }
    }
}

/// A tracked unit of work. See module docs and spec section 3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub parent_id: JobId,
    pub job_definition_id: Option<String>,
    pub source_type: String,
    pub entity_type: String,
    pub config: serde_json::Value,
    pub progress: Progress,
    pub status: JobStatus,
    pub created_at_epoch_ms: u64,
    pub started_at_epoch_ms: Option<u64>,
    pub finished_at_epoch_ms: Option<u64>,
    pub last_heartbeat_epoch_ms: Option<u64>,
    pub error: Option<String>,
    pub result: Option<serde_json::Value>,
}

impl Job {
    pub fn new(config: JobConfig, created_at_epoch_ms: u64) -> Self {
        Self {
            id: config.id,
            kind: config.kind,
            parent_id: config.parent_id,
            job_definition_id: config.job_definition_id,
            source_type: config.source_type,
            entity_type: config.entity_type,
            config: config.config,
            progress: Progress::default(),
            status: JobStatus::Pending,
            created_at_epoch_ms,
            started_at_epoch_ms: None,
            finished_at_epoch_ms: None,
            last_heartbeat_epoch_ms: None,
            error: None,
            result: None,
        }
    }

    /// A root job has no parent; every child points directly at the root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            id: JobId = JobId::from_string("job-test00000000000001"),
            parent_id: JobId = JobId::none(),
            source_type: String = "web",
            entity_type: String = "document",
        }
        set {
            kind: JobKind = JobKind::CrawlerUrl,
            progress: Progress = Progress::default(),
            status: JobStatus = JobStatus::Pending,
            created_at_epoch_ms: u64 = 1_000_000,
            config: serde_json::Value = serde_json::Value::Null,
        }
        option {
            job_definition_id: String = None,
            started_at_epoch_ms: u64 = None,
            finished_at_epoch_ms: u64 = None,
            last_heartbeat_epoch_ms: u64 = None,
            error: String = None,
            result: serde_json::Value = None,
        }
    }
}

/// Computed view over all children of a parent (spec section 3,
/// `ChildStats`): counts by status and by kind. Never stored; derived
/// on demand by the store from the materialized `jobs` map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildStats {
    pub total: usize,
    pub by_status: std::collections::HashMap<JobStatus, usize>,
    pub by_kind: std::collections::HashMap<JobKind, usize>,
}

impl ChildStats {
    pub fn all_terminal(&self) -> bool {
        self.total > 0
            && self
                .by_status
                .iter()
                .filter(|(status, _)| status.is_terminal())
                .map(|(_, count)| count)
                .sum::<usize>()
                == self.total
    }

    pub fn any_failed(&self) -> bool {
        self.by_status.get(&JobStatus::Failed).copied().unwrap_or(0) > 0
    }
}

/// A filter window over [`Job`] listings. Every field is an AND-ed
/// restriction; `None`/empty means unconstrained.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub parent_id: Option<JobId>,
    pub statuses: HashSet<JobStatus>,
    pub kinds: HashSet<JobKind>,
    pub source_type: Option<String>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(parent_id) = &self.parent_id {
            if &job.parent_id != parent_id {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&job.status) {
            return false;
        }
        if !self.kinds.is_empty() && !self.kinds.contains(&job.kind) {
            return false;
        }
        if let Some(source_type) = &self.source_type {
            if &job.source_type != source_type {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

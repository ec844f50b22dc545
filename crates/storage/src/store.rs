//! [`Store`]: the Job Store (spec 4.B) and Durable Queue (spec 4.A)
//! contracts, backed by the WAL-replayed [`MaterializedState`].
//!
//! Every public method that mutates state follows the same shape: build
//! an [`Event`], append it to the WAL, apply it to the in-memory state
//! under the same critical section, flush if the WAL's own batching
//! policy says to. The mutex is held only across that short sequence —
//! never across an I/O call to a processor or the queue.

use crate::snapshot::{Snapshot, SnapshotError};
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};
use parking_lot::Mutex;
use quaero_core::{
    ChildStats, Clock, Event, Job, JobConfig, JobFilter, JobId, JobKind, JobStatus, LogEvent,
    LogLevel, LogRecord, MessageId, QueueMessage,
};
use std::collections::{hash_map::DefaultHasher, HashMap};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("job not found: {0}")]
    JobNotFound(JobId),
    #[error("illegal status transition for job {id}: {from} -> {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
    #[error("job {0} must be cancelled before it can be deleted")]
    RunningJobNotDeletable(JobId),
    #[error("cascade delete for {0} exceeded the recursion depth limit")]
    DepthLimitExceeded(JobId),
}

/// Maximum depth [`Store::delete_job`] will walk resolving a cascade
/// (spec 4.B: "Depth-limited recursion (<=10) as a safety check against
/// accidental cycles; real cycles are impossible given the flat
/// hierarchy but the limit is enforced").
const MAX_CASCADE_DEPTH: usize = 10;

/// A message handed back by [`Store::receive`]: the envelope plus the
/// receive count it now carries, which the pool needs to decide whether
/// a subsequent failure should release or drop it.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub message: QueueMessage,
    pub receive_count: u32,
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
    snapshot_path: PathBuf,
}

/// The single writer for all durable engine state. Cheap to clone-share
/// via `Arc` at the call sites that need it; internally synchronized.
pub struct Store<C: Clock> {
    inner: Mutex<Inner>,
    clock: C,
}

impl<C: Clock> Store<C> {
    /// Open (or create) the store rooted at `wal_path`. The snapshot, if
    /// one exists at `wal_path` with a `.snap` extension, is loaded first
    /// and the WAL is replayed from just after its sequence number.
    pub fn open(wal_path: impl AsRef<Path>, clock: C) -> Result<Self, StoreError> {
        let wal_path = wal_path.as_ref().to_path_buf();
        let snapshot_path = wal_path.with_extension("snap");

        let (mut state, snapshot_seq) = match Snapshot::load(&snapshot_path) {
            Ok(snapshot) => (snapshot.state, snapshot.seq),
            Err(_) => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(&wal_path, snapshot_seq)?;
        for entry in wal.entries_after(snapshot_seq)? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                wal,
                state,
                snapshot_path,
            }),
            clock,
        })
    }

    /// Append `event`, apply it, and fsync before returning. Every
    /// caller of `commit` is a durability boundary — a job creation, a
    /// status transition, an enqueue — so the flush here is
    /// unconditional rather than batched: a crash right after any
    /// mutating `Store` method returns must not lose that mutation.
    fn commit(&self, inner: &mut Inner, event: Event) -> Result<(), StoreError> {
        let seq = inner.wal.append(&event)?;
        inner.state.apply_event(&event);
        inner.wal.mark_processed(seq);
        inner.wal.flush()?;
        Ok(())
    }

    /// Force a flush and write a fresh snapshot, letting the WAL be
    /// truncated up to the snapshot's sequence number. Operators may call
    /// this periodically; it is never required for correctness.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.wal.flush()?;
        let seq = inner.wal.processed_seq();
        let snapshot = Snapshot::new(seq, inner.state.clone(), chrono::Utc::now());
        snapshot.save(&inner.snapshot_path)?;
        inner.wal.truncate_before(seq + 1)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Job Store (spec 4.B)
    // ---------------------------------------------------------------

    pub fn create_job(&self, config: JobConfig) -> Result<Job, StoreError> {
        let mut inner = self.inner.lock();
        let created_at_epoch_ms = self.clock.epoch_ms();
        let id = config.id;
        self.commit(
            &mut inner,
            Event::JobCreated {
                config,
                created_at_epoch_ms,
            },
        )?;
        inner
            .state
            .get_job(id.as_str())
            .cloned()
            .ok_or(StoreError::JobNotFound(id))
    }

    pub fn set_job_total(&self, id: JobId, total: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::JobTotalSet { id, total })
    }

    /// Re-bases a parent's progress to `(total, 0, 0)`, unconditionally.
    /// Used between steps of a multi-step job definition; see
    /// `Event::JobProgressReset`.
    pub fn reset_job_progress(&self, id: JobId, total: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::JobProgressReset { id, total })
    }

    pub fn get_job(&self, id: &str) -> Option<Job> {
        self.inner.lock().state.get_job(id).cloned()
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        let inner = self.inner.lock();
        let mut jobs: Vec<Job> = inner
            .state
            .jobs
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect();
        jobs.sort_by_key(|job| job.created_at_epoch_ms);
        let jobs = jobs.into_iter().skip(filter.offset);
        match filter.limit {
            Some(limit) => jobs.take(limit).collect(),
            None => jobs.collect(),
        }
    }

    /// Transition `id` to `status`, rejecting illegal transitions per
    /// [`JobStatus::can_transition_to`]. `allow_recovery` should only ever
    /// be `true` from [`Store::mark_running_jobs_as_pending`].
    pub fn update_job_status(
        &self,
        id: JobId,
        status: JobStatus,
        error: Option<String>,
    ) -> Result<Job, StoreError> {
        let mut inner = self.inner.lock();
        let current = inner
            .state
            .get_job(id.as_str())
            .cloned()
            .ok_or(StoreError::JobNotFound(id))?;
        if !current.status.can_transition_to(status, false) {
            return Err(StoreError::InvalidTransition {
                id,
                from: current.status,
                to: status,
            });
        }
        let at_epoch_ms = self.clock.epoch_ms();
        self.commit(
            &mut inner,
            Event::JobStatusChanged {
                id,
                status,
                error,
                at_epoch_ms,
            },
        )?;
        Ok(inner
            .state
            .get_job(id.as_str())
            .cloned()
            .unwrap_or(current))
    }

    pub fn set_job_result(&self, id: JobId, result: serde_json::Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::JobResultSet { id, result })
    }

    /// The only sanctioned way to move progress counters (spec 4.D:
    /// "progress counters on the parent job are updated *only* through
    /// `UpdateProgressCountersAtomic`"). Returns the post-update counters.
    pub fn update_progress_counters_atomic(
        &self,
        id: JobId,
        delta_completed: u64,
        delta_failed: u64,
    ) -> Result<quaero_core::Progress, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.jobs.contains_key(id.as_str()) {
            return Err(StoreError::JobNotFound(id));
        }
        self.commit(
            &mut inner,
            Event::JobProgressDelta {
                id,
                delta_completed,
                delta_failed,
            },
        )?;
        Ok(inner
            .state
            .get_job(id.as_str())
            .map(|job| job.progress)
            .unwrap_or_default())
    }

    pub fn heartbeat(&self, id: JobId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let at_epoch_ms = self.clock.epoch_ms();
        self.commit(&mut inner, Event::JobHeartbeat { id, at_epoch_ms })
    }

    /// Depth-limited cascade resolution + delete. Refuses a job still
    /// `running` (caller must cancel first). Returns the number of
    /// children removed (the parent itself is not counted).
    pub fn delete_job(&self, id: JobId) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock();
        let root = inner
            .state
            .get_job(id.as_str())
            .cloned()
            .ok_or(StoreError::JobNotFound(id))?;
        if root.status == JobStatus::Running {
            return Err(StoreError::RunningJobNotDeletable(id));
        }

        let mut affected: Vec<JobId> = vec![id];
        let mut frontier = vec![id];
        let mut exhausted = false;
        for _ in 0..MAX_CASCADE_DEPTH {
            let children: Vec<JobId> = inner
                .state
                .jobs
                .values()
                .filter(|job| frontier.iter().any(|p| job.parent_id == p.as_str()))
                .map(|job| job.id)
                .collect();
            if children.is_empty() {
                exhausted = true;
                break;
            }
            affected.extend(children.iter().copied());
            frontier = children;
        }
        if !exhausted {
            return Err(StoreError::DepthLimitExceeded(id));
        }

        let cascade_count = affected.len() - 1;
        self.commit(&mut inner, Event::JobsDeleted { ids: affected })?;
        Ok(cascade_count)
    }

    /// `StopAllChildJobs(parentID)` (spec 4.E, 4.E failure semantics):
    /// every non-terminal direct child of `parent_id` is flipped to
    /// `cancelled` with `error`. Returns the number of children affected.
    pub fn stop_all_child_jobs(&self, parent_id: JobId, error: &str) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock();
        let ids: Vec<JobId> = inner
            .state
            .jobs
            .values()
            .filter(|job| job.parent_id == parent_id.as_str() && !job.status.is_terminal())
            .map(|job| job.id)
            .collect();
        let at_epoch_ms = self.clock.epoch_ms();
        for id in &ids {
            self.commit(
                &mut inner,
                Event::JobStatusChanged {
                    id: *id,
                    status: JobStatus::Cancelled,
                    error: Some(error.to_string()),
                    at_epoch_ms,
                },
            )?;
        }
        Ok(ids.len())
    }

    /// `CopyJob(id) → newID` (spec section 4.E job-management API): a
    /// fresh root job carrying the same kind/config/source/entity as
    /// `id`, for re-running a job without its prior progress or history.
    pub fn copy_job(&self, id: JobId) -> Result<Job, StoreError> {
        let source = self.get_job(id.as_str()).ok_or(StoreError::JobNotFound(id))?;
        let config = JobConfig::builder(source.kind)
            .source_type(source.source_type)
            .entity_type(source.entity_type)
            .config(source.config)
            .build();
        self.create_job(config)
    }

    pub fn get_job_child_stats(&self, parent_ids: &[JobId]) -> HashMap<JobId, ChildStats> {
        let inner = self.inner.lock();
        let mut out: HashMap<JobId, ChildStats> = parent_ids
            .iter()
            .map(|id| (*id, ChildStats::default()))
            .collect();
        for job in inner.state.jobs.values() {
            if let Some(stats) = out.get_mut(&job.parent_id) {
                stats.total += 1;
                *stats.by_status.entry(job.status).or_insert(0) += 1;
                *stats.by_kind.entry(job.kind).or_insert(0) += 1;
            }
        }
        out
    }

    pub fn list_running_jobs(&self) -> Vec<Job> {
        let inner = self.inner.lock();
        inner
            .state
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Running)
            .cloned()
            .collect()
    }

    /// Startup recovery hook (spec 4.B): every job left `running` from an
    /// ungraceful shutdown is demoted to `pending` in a single event.
    pub fn mark_running_jobs_as_pending(&self) -> Result<Vec<JobId>, StoreError> {
        let mut inner = self.inner.lock();
        let ids: Vec<JobId> = inner
            .state
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Running)
            .map(|job| job.id)
            .collect();
        if ids.is_empty() {
            return Ok(ids);
        }
        let at_epoch_ms = self.clock.epoch_ms();
        self.commit(
            &mut inner,
            Event::RunningJobsMarkedPending {
                ids: ids.clone(),
                at_epoch_ms,
            },
        )?;
        Ok(ids)
    }

    /// Running jobs whose heartbeat (or, absent one, start time) predates
    /// `now - threshold` (spec 4.D stall detection).
    pub fn list_stale_jobs(&self, threshold: Duration) -> Vec<Job> {
        let inner = self.inner.lock();
        let now = self.clock.epoch_ms();
        let threshold_ms = threshold.as_millis() as u64;
        inner
            .state
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Running)
            .filter(|job| {
                let last_activity = job
                    .last_heartbeat_epoch_ms
                    .or(job.started_at_epoch_ms)
                    .unwrap_or(job.created_at_epoch_ms);
                now.saturating_sub(last_activity) >= threshold_ms
            })
            .cloned()
            .collect()
    }

    /// Insert-if-absent dedup (spec 4.B `MarkURLSeen`). Returns whether
    /// the URL was newly inserted — the caller should enqueue it only
    /// when this is `true`.
    pub fn mark_url_seen(&self, job_id: JobId, url: &str) -> Result<bool, StoreError> {
        let hash = hash_url(url);
        let mut inner = self.inner.lock();
        if inner.state.has_seen_url(job_id.as_str(), &hash) {
            return Ok(false);
        }
        self.commit(
            &mut inner,
            Event::UrlSeen {
                job_id,
                url_hash: hash,
            },
        )?;
        Ok(true)
    }

    // ---------------------------------------------------------------
    // Log Pipeline storage (spec 4.C)
    // ---------------------------------------------------------------

    /// Append a batch of events, assigning each the next per-job sequence
    /// number. Events with different `job_id`s in the same batch are
    /// grouped before being committed, one `LogsAppended` event per job.
    pub fn append_logs(&self, events: &[LogEvent]) -> Result<Vec<LogRecord>, StoreError> {
        let mut inner = self.inner.lock();
        let mut by_job: HashMap<String, Vec<&LogEvent>> = HashMap::new();
        for event in events {
            by_job
                .entry(event.job_id.to_string())
                .or_default()
                .push(event);
        }

        let mut all_records = Vec::with_capacity(events.len());
        for (job_id, group) in by_job {
            let mut next_seq = inner.state.next_log_sequence(&job_id);
            let mut records = Vec::with_capacity(group.len());
            for event in group {
                records.push(LogRecord {
                    job_id: event.job_id,
                    sequence: next_seq,
                    timestamp_epoch_ms: event.timestamp_epoch_ms,
                    level: event.level,
                    message: event.message.clone(),
                    fields: event.fields.clone(),
                });
                next_seq += 1;
            }
            self.commit(
                &mut inner,
                Event::LogsAppended {
                    job_id: records[0].job_id,
                    records: records.clone(),
                },
            )?;
            all_records.extend(records);
        }
        Ok(all_records)
    }

    /// Paged read over one job's logs ordered by `(timestamp, sequence)`.
    /// Returns the filtered page plus the *raw* count of records read
    /// from storage before filtering — callers must advance their own
    /// offset by the raw count (spec 4.C correctness point (a)), not the
    /// filtered count, or pagination silently skips or duplicates rows.
    pub fn get_logs(
        &self,
        job_id: &str,
        offset: usize,
        limit: usize,
        level_filter: Option<LogLevel>,
        descending: bool,
    ) -> (Vec<LogRecord>, usize) {
        let inner = self.inner.lock();
        let mut records: Vec<LogRecord> = inner.state.logs_for(job_id).to_vec();
        records.sort_by_key(|r| (r.timestamp_epoch_ms, r.sequence));
        if descending {
            records.reverse();
        }
        let window: Vec<LogRecord> = records.into_iter().skip(offset).take(limit).collect();
        let raw_count = window.len();
        let filtered = window
            .into_iter()
            .filter(|r| match level_filter {
                Some(min) => r.level >= min,
                None => true,
            })
            .collect();
        (filtered, raw_count)
    }

    /// Job kinds used by the log-pipeline aggregation to discover all
    /// children of a parent without pulling the whole job record.
    pub fn child_ids(&self, parent_id: &str) -> Vec<JobId> {
        let inner = self.inner.lock();
        inner
            .state
            .jobs
            .values()
            .filter(|job| job.parent_id == parent_id)
            .map(|job| job.id)
            .collect()
    }

    // ---------------------------------------------------------------
    // Durable Queue (spec 4.A)
    // ---------------------------------------------------------------

    pub fn enqueue(&self, message: QueueMessage, delay: Duration) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let visible_at_epoch_ms = self.clock.epoch_ms() + delay.as_millis() as u64;
        self.commit(
            &mut inner,
            Event::MessageEnqueued {
                message,
                visible_at_epoch_ms,
            },
        )
    }

    /// Receive the oldest currently-visible message, making it invisible
    /// for `visibility_timeout`. A message whose receive count would
    /// exceed `max_receive` is dead-lettered instead of being handed out;
    /// the scan continues to the next-oldest visible message.
    pub fn receive(
        &self,
        visibility_timeout: Duration,
        max_receive: u32,
    ) -> Result<Option<ReceivedMessage>, StoreError> {
        let mut inner = self.inner.lock();
        let now = self.clock.epoch_ms();
        loop {
            let Some(record) = inner.state.next_visible_message(now) else {
                return Ok(None);
            };
            let id = record.message.id;
            let next_count = record.receive_count + 1;

            if next_count > max_receive {
                self.commit(&mut inner, Event::MessageDropped { id })?;
                continue;
            }

            let invisible_until_epoch_ms = now + visibility_timeout.as_millis() as u64;
            let message = record.message.clone();
            self.commit(
                &mut inner,
                Event::MessageReceived {
                    id,
                    receive_count: next_count,
                    invisible_until_epoch_ms,
                },
            )?;
            return Ok(Some(ReceivedMessage {
                message,
                receive_count: next_count,
            }));
        }
    }

    pub fn delete_message(&self, id: MessageId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::MessageDeleted { id })
    }

    pub fn extend_visibility(&self, id: MessageId, duration: Duration) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let invisible_until_epoch_ms = self.clock.epoch_ms() + duration.as_millis() as u64;
        self.commit(
            &mut inner,
            Event::MessageVisibilityExtended {
                id,
                invisible_until_epoch_ms,
            },
        )
    }

    pub fn release_message(&self, id: MessageId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, Event::MessageReleased { id })
    }

    pub fn queue_length(&self) -> usize {
        self.inner.lock().state.queue_len()
    }

    /// Test/diagnostic helper: whether a processor kind has been
    /// observed on any currently-queued message. Not part of the spec
    /// contract; used by executor tests to assert enqueue shape.
    #[cfg(any(test, feature = "test-support"))]
    pub fn queued_kinds(&self) -> Vec<JobKind> {
        self.inner
            .lock()
            .state
            .queue
            .values()
            .map(|record| record.message.kind)
            .collect()
    }
}

fn hash_url(url: &str) -> String {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

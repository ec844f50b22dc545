//! The structured log pipeline (spec 4.C): a batching writer/broadcaster
//! fed by a bounded channel, plus `GetAggregatedLogs`, a heap-merge read
//! across a parent and all of its children.

use base64::Engine;
use quaero_core::{Clock, DisplayLogEntry, JobId, LogConfig, LogEvent, LogLevel, LogRecord};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use quaero_storage::Store;

/// Handed to producers (processors, the pool, the executor) so they can
/// emit logs without touching the store or the broadcaster directly.
/// Cheap to clone; every clone shares the same upstream batch channel.
#[derive(Clone)]
pub struct LogSink {
    pub(crate) tx: mpsc::Sender<Vec<LogEvent>>,
}

impl LogSink {
    /// Hand a pre-batched slice of events to the pipeline (the "producers
    /// hand the pipeline a batch channel" half of the producer contract;
    /// upstream batching is the caller's concern, e.g. a tracing layer).
    pub async fn emit_batch(&self, events: Vec<LogEvent>) {
        if events.is_empty() {
            return;
        }
        if self.tx.send(events).await.is_err() {
            debug!("log pipeline shut down; dropping log batch");
        }
    }

    pub async fn emit(
        &self,
        job_id: JobId,
        correlation_id: JobId,
        level: LogLevel,
        message: impl Into<String>,
        epoch_ms: u64,
    ) {
        self.emit_batch(vec![LogEvent::new(job_id, correlation_id, level, message, epoch_ms)])
            .await;
    }
}

/// Direction for [`LogPipeline::get_aggregated_logs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// An opaque resume point: `base64(timestamp | job_id | sequence)` of the
/// last entry emitted on the previous page (spec 4.C point 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub timestamp_epoch_ms: u64,
    pub job_id: JobId,
    pub sequence: u64,
}

impl Cursor {
    pub fn encode(&self) -> String {
        let raw = format!("{}|{}|{}", self.timestamp_epoch_ms, self.job_id, self.sequence);
        base64::engine::general_purpose::STANDARD.encode(raw)
    }

    pub fn decode(s: &str) -> Result<Self, String> {
        let raw = base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(|e| format!("invalid cursor: {e}"))?;
        let raw = String::from_utf8(raw).map_err(|e| format!("invalid cursor: {e}"))?;
        let mut parts = raw.splitn(3, '|');
        let timestamp_epoch_ms = parts
            .next()
            .ok_or_else(|| "invalid cursor: missing timestamp".to_string())?
            .parse()
            .map_err(|e| format!("invalid cursor timestamp: {e}"))?;
        let job_id = parts
            .next()
            .ok_or_else(|| "invalid cursor: missing job id".to_string())?;
        let sequence = parts
            .next()
            .ok_or_else(|| "invalid cursor: missing sequence".to_string())?
            .parse()
            .map_err(|e| format!("invalid cursor sequence: {e}"))?;
        Ok(Self {
            timestamp_epoch_ms,
            job_id: JobId::from_string(job_id),
            sequence,
        })
    }

    /// Whether `(timestamp, sequence, job_id)` has already been emitted
    /// by a previous page in the given direction (spec 4.C point (b):
    /// cursor comparison uses the full timestamp plus sequence, never
    /// indices). `sequence` is only unique per job, so two jobs logging
    /// in the same millisecond can share a `(timestamp, sequence)` pair —
    /// `job_id` must be part of the key, in the same tie-break order as
    /// `HeapKey`, or the comparison can mistake one job's unemitted entry
    /// for another's already-emitted one.
    fn already_emitted(&self, record: &LogRecord, direction: Direction) -> bool {
        let key = (record.timestamp_epoch_ms, record.sequence, record.job_id.to_string());
        let cursor_key = (self.timestamp_epoch_ms, self.sequence, self.job_id.to_string());
        match direction {
            Direction::Ascending => key <= cursor_key,
            Direction::Descending => key >= cursor_key,
        }
    }
}

/// A page returned by [`LogPipeline::get_aggregated_logs`].
#[derive(Debug, Clone, Default)]
pub struct AggregatedLogsPage {
    pub entries: Vec<DisplayLogEntry>,
    pub next_cursor: Option<String>,
}

const PER_JOB_PAGE_SIZE: usize = 64;

/// Lazily-paged view over one job's logs, used only inside
/// `get_aggregated_logs`. Always advances `offset` by the *raw* count
/// read from storage (spec 4.C point (a)), never by the post-filter
/// count, so repeated refills can't skip or duplicate rows.
struct JobLogIter {
    job_id: JobId,
    offset: usize,
    buffer: VecDeque<LogRecord>,
    exhausted: bool,
}

impl JobLogIter {
    fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            offset: 0,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn refill<C: Clock>(
        &mut self,
        store: &Store<C>,
        level_filter: Option<LogLevel>,
        descending: bool,
        cursor: Option<&Cursor>,
        direction: Direction,
    ) {
        if self.exhausted || !self.buffer.is_empty() {
            return;
        }
        let (page, raw_count) = store.get_logs(
            self.job_id.as_str(),
            self.offset,
            PER_JOB_PAGE_SIZE,
            level_filter,
            descending,
        );
        self.offset += raw_count;
        if raw_count < PER_JOB_PAGE_SIZE {
            self.exhausted = true;
        }
        self.buffer.extend(page.into_iter().filter(|record| {
            cursor.map(|c| !c.already_emitted(record, direction)).unwrap_or(true)
        }));
    }

    fn peek<C: Clock>(
        &mut self,
        store: &Store<C>,
        level_filter: Option<LogLevel>,
        descending: bool,
        cursor: Option<&Cursor>,
        direction: Direction,
    ) -> Option<&LogRecord> {
        while self.buffer.is_empty() && !self.exhausted {
            self.refill(store, level_filter, descending, cursor, direction);
        }
        self.buffer.front()
    }

    fn pop(&mut self) -> Option<LogRecord> {
        self.buffer.pop_front()
    }
}

/// Key used by the merge heap: `(timestamp, sequence, job_id)` (spec 4.C
/// point (c) plus point 5's tie-break rule). Captured once when the
/// entry is pushed, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct HeapKey(u64, u64, String);

struct HeapEntry {
    key: HeapKey,
    record: LogRecord,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// The log pipeline: owns the batching/broadcast background task and
/// answers `GetAggregatedLogs` reads directly against the store.
pub struct LogPipeline<C: Clock> {
    store: Arc<Store<C>>,
    batch_tx: mpsc::Sender<Vec<LogEvent>>,
    broadcast_tx: broadcast::Sender<DisplayLogEntry>,
}

impl<C: Clock> LogPipeline<C> {
    /// Spawn the dedicated draining task and return the handle. The
    /// channel holds ~10 upstream batches before producers start
    /// backpressuring (spec 4.C: producers hand off slices; this
    /// pipeline does its own secondary coalescing on top).
    pub fn spawn(store: Arc<Store<C>>, config: LogConfig, cancellation: CancellationToken) -> Self {
        let (batch_tx, batch_rx) = mpsc::channel(10);
        let (broadcast_tx, _) = broadcast::channel(1024);

        let worker = PipelineWorker {
            store: Arc::clone(&store),
            broadcast_tx: broadcast_tx.clone(),
            batch_rx,
            config,
            cancellation,
        };
        tokio::spawn(worker.run());

        Self {
            store,
            batch_tx,
            broadcast_tx,
        }
    }

    pub fn sink(&self) -> LogSink {
        LogSink {
            tx: self.batch_tx.clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DisplayLogEntry> {
        self.broadcast_tx.subscribe()
    }

    /// `GetAggregatedLogs` (spec 4.C): merge the parent's own logs with
    /// every direct child's, in `(timestamp, sequence, job_id)` order.
    pub fn get_aggregated_logs(
        &self,
        parent_id: &str,
        limit: usize,
        direction: Direction,
        level_filter: Option<LogLevel>,
        cursor: Option<&Cursor>,
    ) -> AggregatedLogsPage {
        let descending = direction == Direction::Descending;
        let mut job_ids = vec![JobId::from_string(parent_id)];
        job_ids.extend(self.store.child_ids(parent_id));

        let mut iters: Vec<JobLogIter> = job_ids.into_iter().map(JobLogIter::new).collect();
        let mut heap: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::new();

        for iter in iters.iter_mut() {
            if let Some(record) =
                iter.peek(&self.store, level_filter, descending, cursor, direction).cloned()
            {
                heap.push(Reverse(make_entry(record, descending)));
            }
        }

        let mut entries = Vec::with_capacity(limit);
        let mut by_job: std::collections::HashMap<String, usize> = iters
            .iter()
            .enumerate()
            .map(|(idx, it)| (it.job_id.to_string(), idx))
            .collect();

        while entries.len() < limit {
            let Some(Reverse(top)) = heap.pop() else {
                break;
            };
            let job_key = top.record.job_id.to_string();
            let Some(&idx) = by_job.get(&job_key) else {
                continue;
            };
            let iter = &mut iters[idx];
            iter.pop();
            entries.push(DisplayLogEntry::from_record(&top.record));

            if let Some(next) =
                iter.peek(&self.store, level_filter, descending, cursor, direction).cloned()
            {
                heap.push(Reverse(make_entry(next, descending)));
            }
        }

        let has_more = !heap.is_empty()
            || iters.iter_mut().any(|it| {
                it.peek(&self.store, level_filter, descending, cursor, direction).is_some()
            });

        let next_cursor = if has_more {
            entries.last().map(|last| {
                Cursor {
                    timestamp_epoch_ms: last.timestamp_epoch_ms,
                    job_id: last.job_id,
                    sequence: last.sequence,
                }
                .encode()
            })
        } else {
            None
        };

        AggregatedLogsPage {
            entries,
            next_cursor,
        }
    }
}

/// Descending mode needs the heap to pop the *largest* key first; we
/// achieve that uniformly through `Reverse<HeapEntry>` (always a
/// min-heap) by negating the comparison direction at construction time
/// instead of re-deriving `Ord` per direction.
fn make_entry(record: LogRecord, descending: bool) -> HeapEntry {
    let key = HeapKey(record.timestamp_epoch_ms, record.sequence, record.job_id.to_string());
    let key = if descending {
        HeapKey(u64::MAX - key.0, u64::MAX - key.1, key.2)
    } else {
        key
    };
    HeapEntry { key, record }
}

struct PipelineWorker<C: Clock> {
    store: Arc<Store<C>>,
    broadcast_tx: broadcast::Sender<DisplayLogEntry>,
    batch_rx: mpsc::Receiver<Vec<LogEvent>>,
    config: LogConfig,
    cancellation: CancellationToken,
}

impl<C: Clock> PipelineWorker<C> {
    async fn run(mut self) {
        let mut buffer: Vec<LogEvent> = Vec::with_capacity(self.config.batch_size);
        let mut ticker = tokio::time::interval(self.config.batch_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancellation.cancelled() => {
                    self.flush(&mut buffer);
                    break;
                }
                maybe_batch = self.batch_rx.recv() => {
                    match maybe_batch {
                        Some(events) => {
                            buffer.extend(events);
                            if buffer.len() >= self.config.batch_size {
                                self.flush(&mut buffer);
                            }
                        }
                        None => {
                            self.flush(&mut buffer);
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    if !buffer.is_empty() {
                        self.flush(&mut buffer);
                    }
                }
            }
        }
    }

    fn flush(&self, buffer: &mut Vec<LogEvent>) {
        if buffer.is_empty() {
            return;
        }
        let events: Vec<LogEvent> = buffer.drain(..).collect();
        match self.store.append_logs(&events) {
            Ok(records) => {
                for record in &records {
                    if self.broadcast_tx.send(DisplayLogEntry::from_record(record)).is_err() {
                        debug!(job_id = %record.job_id, "no subscribers for broadcast log entry");
                    }
                }
            }
            Err(error) => {
                tracing::error!(%error, "failed to append log batch");
            }
        }
    }
}

#[cfg(test)]
#[path = "log_pipeline_tests.rs"]
mod tests;

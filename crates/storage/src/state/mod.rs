//! Materialized state rebuilt by replaying [`quaero_core::Event`]s from
//! the WAL. Event application must be idempotent where the field is a
//! plain overwrite (status, result, visibility); see each submodule for
//! the one exception (progress counters), which is additive by design.

mod helpers;
mod jobs;
mod logs;
mod queue;
mod types;
mod urls;

pub use types::QueueRecord;

use quaero_core::{Event, Job, LogRecord, QueueMessage};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub jobs: HashMap<String, Job>,
    pub queue: HashMap<String, QueueRecord>,
    /// Messages whose receive count exceeded `max_receive`. Retained (not
    /// discarded) so an operator can inspect why a job stalled.
    pub dead_letters: HashMap<String, QueueMessage>,
    pub logs: HashMap<String, Vec<LogRecord>>,
    pub seen_urls: HashMap<String, HashSet<String>>,
}

impl MaterializedState {
    /// Look up a job by exact id or by unique suffix.
    pub fn get_job(&self, id: &str) -> Option<&Job> {
        helpers::find_by_prefix(&self.jobs, id)
    }

    /// Apply an event, mutating state in place. Idempotent for every
    /// variant except `JobProgressDelta` (additive, see module docs).
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::JobCreated { .. }
            | Event::JobTotalSet { .. }
            | Event::JobProgressDelta { .. }
            | Event::JobProgressReset { .. }
            | Event::JobStatusChanged { .. }
            | Event::JobResultSet { .. }
            | Event::JobHeartbeat { .. }
            | Event::RunningJobsMarkedPending { .. }
            | Event::JobsDeleted { .. } => jobs::apply(self, event),

            Event::MessageEnqueued { .. }
            | Event::MessageReceived { .. }
            | Event::MessageVisibilityExtended { .. }
            | Event::MessageDeleted { .. }
            | Event::MessageReleased { .. }
            | Event::MessageDropped { .. } => queue::apply(self, event),

            Event::LogsAppended { .. } => logs::apply(self, event),

            Event::UrlSeen { .. } => urls::apply(self, event),
        }
    }
}

#[cfg(test)]
#[path = "../state_tests/mod.rs"]
mod tests;

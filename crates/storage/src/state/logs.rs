//! Job log event handlers.
//!
//! `sequence` is assigned by the caller (the log pipeline holds the
//! single counter) before the event is built, so applying `LogsAppended`
//! is a plain append — the guard below only protects against the same
//! batch landing twice (e.g. a crash between WAL flush and the caller
//! being told the append succeeded).

use super::MaterializedState;
use quaero_core::Event;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    if let Event::LogsAppended { job_id, records } = event {
        let existing = state.logs.entry(job_id.to_string()).or_default();
        let next_expected = existing.last().map(|r| r.sequence + 1).unwrap_or(0);
        for record in records {
            if record.sequence >= next_expected {
                existing.push(record.clone());
            }
        }
    }
}

impl MaterializedState {
    pub fn logs_for(&self, job_id: &str) -> &[quaero_core::LogRecord] {
        self.logs.get(job_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn next_log_sequence(&self, job_id: &str) -> u64 {
        self.logs
            .get(job_id)
            .and_then(|records| records.last())
            .map(|r| r.sequence + 1)
            .unwrap_or(0)
    }
}

use super::*;
use quaero_core::{JobId, LogLevel, LogRecord};
use std::collections::BTreeMap;

fn record(sequence: u64) -> LogRecord {
    LogRecord {
        job_id: JobId::from_string("job-test00000000000010"),
        sequence,
        timestamp_epoch_ms: 1_000 + sequence,
        level: LogLevel::Info,
        message: format!("entry {sequence}"),
        fields: BTreeMap::new(),
    }
}

#[test]
fn appended_logs_are_stored_in_order() {
    let mut state = MaterializedState::default();
    let job_id = "job-test00000000000010";
    state.apply_event(&Event::LogsAppended {
        job_id: JobId::from_string(job_id),
        records: vec![record(0), record(1)],
    });

    let logs = state.logs_for(job_id);
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].sequence, 0);
    assert_eq!(logs[1].sequence, 1);
    assert_eq!(state.next_log_sequence(job_id), 2);
}

#[test]
fn replaying_the_same_batch_does_not_duplicate_entries() {
    let mut state = MaterializedState::default();
    let job_id = "job-test00000000000010";
    let batch = vec![record(0), record(1)];
    state.apply_event(&Event::LogsAppended {
        job_id: JobId::from_string(job_id),
        records: batch.clone(),
    });
    state.apply_event(&Event::LogsAppended {
        job_id: JobId::from_string(job_id),
        records: batch,
    });

    assert_eq!(state.logs_for(job_id).len(), 2);
}

#[test]
fn a_lower_sequence_than_expected_is_dropped_not_duplicated() {
    let mut state = MaterializedState::default();
    let job_id = "job-test00000000000010";
    state.apply_event(&Event::LogsAppended {
        job_id: JobId::from_string(job_id),
        records: vec![record(0), record(1)],
    });
    state.apply_event(&Event::LogsAppended {
        job_id: JobId::from_string(job_id),
        records: vec![record(1), record(2)],
    });

    let logs = state.logs_for(job_id);
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[2].sequence, 2);
}

#[test]
fn logs_for_unknown_job_is_empty() {
    let state = MaterializedState::default();
    assert!(state.logs_for("job-nonexistent00000001").is_empty());
    assert_eq!(state.next_log_sequence("job-nonexistent00000001"), 0);
}

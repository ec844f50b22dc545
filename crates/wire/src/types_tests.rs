use super::*;
use quaero_core::{JobBuilder, Progress};

#[test]
fn progress_summary_from_progress_computes_pending() {
    let progress = Progress {
        total: 10,
        completed: 4,
        failed: 1,
    };
    let summary: ProgressSummary = progress.into();
    assert_eq!(summary.total, 10);
    assert_eq!(summary.completed, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.pending, 5);
}

#[test]
fn job_summary_from_job_truncates_error_for_display() {
    let long_error = "x".repeat(500);
    let job = JobBuilder::default().error(long_error.clone()).build();

    let summary = JobSummary::from(&job);
    assert!(summary.error.is_some());
    assert!(summary.error.unwrap().len() < long_error.len());
}

#[test]
fn job_summary_carries_timestamps_and_status() {
    let job = JobBuilder::default().build();
    let summary = JobSummary::from(&job);
    assert_eq!(summary.id, job.id.to_string());
    assert_eq!(summary.status, job.status.to_string());
    assert_eq!(summary.created_at_epoch_ms, job.created_at_epoch_ms);
}

#[test]
fn job_filter_wire_default_parses_to_empty_filter() {
    let wire = JobFilterWire::default();
    let filter = wire.into_filter().expect("default filter should parse");
    assert!(filter.statuses.is_empty());
    assert!(filter.kinds.is_empty());
    assert_eq!(filter.offset, 0);
    assert_eq!(filter.limit, None);
}

#[test]
fn job_filter_wire_parses_known_statuses_and_kinds() {
    let wire = JobFilterWire {
        statuses: vec!["running".to_string(), "completed".to_string()],
        kinds: vec!["crawler_url".to_string()],
        ..Default::default()
    };
    let filter = wire.into_filter().expect("should parse");
    assert_eq!(filter.statuses.len(), 2);
    assert_eq!(filter.kinds.len(), 1);
}

#[test]
fn job_filter_wire_rejects_unknown_status() {
    let wire = JobFilterWire {
        statuses: vec!["bogus".to_string()],
        ..Default::default()
    };
    let result = wire.into_filter();
    assert!(result.is_err());
}

#[test]
fn job_filter_wire_rejects_unknown_kind() {
    let wire = JobFilterWire {
        kinds: vec!["bogus_kind".to_string()],
        ..Default::default()
    };
    let result = wire.into_filter();
    assert!(result.is_err());
}

#[test]
fn job_filter_wire_round_trips_through_json() {
    let wire = JobFilterWire {
        parent_id: Some("parent-1".to_string()),
        statuses: vec!["pending".to_string()],
        kinds: vec![],
        source_type: Some("web".to_string()),
        offset: 5,
        limit: Some(20),
    };
    let json = serde_json::to_string(&wire).expect("serialize failed");
    let back: JobFilterWire = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(wire, back);
}

#[test]
fn job_filter_wire_missing_fields_default() {
    let json = "{}";
    let wire: JobFilterWire = serde_json::from_str(json).expect("deserialize failed");
    assert_eq!(wire, JobFilterWire::default());
}

use super::*;
use crate::types::{JobSummary, LogEntryWire, ProgressSummary};

fn sample_job_summary() -> JobSummary {
    JobSummary {
        id: "job-1".to_string(),
        kind: "crawler_url".to_string(),
        parent_id: "".to_string(),
        source_type: "web".to_string(),
        entity_type: "page".to_string(),
        status: "pending".to_string(),
        progress: ProgressSummary::default(),
        created_at_epoch_ms: 1_000,
        started_at_epoch_ms: None,
        finished_at_epoch_ms: None,
        error: None,
        result: None,
    }
}

#[test]
fn ok_serializes_with_type_tag_only() {
    let json = serde_json::to_value(Response::Ok).expect("serialize failed");
    assert_eq!(json["type"], "Ok");
}

#[test]
fn job_created_round_trips() {
    let response = Response::JobCreated {
        id: "job-1".to_string(),
    };
    let json = serde_json::to_string(&response).expect("serialize failed");
    let back: Response = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(response, back);
}

#[test]
fn job_response_with_none_round_trips() {
    let response = Response::Job { job: None };
    let json = serde_json::to_string(&response).expect("serialize failed");
    let back: Response = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(response, back);
}

#[test]
fn job_response_with_summary_round_trips() {
    let response = Response::Job {
        job: Some(Box::new(sample_job_summary())),
    };
    let json = serde_json::to_string(&response).expect("serialize failed");
    let back: Response = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(response, back);
}

#[test]
fn jobs_response_round_trips() {
    let response = Response::Jobs {
        jobs: vec![sample_job_summary()],
    };
    let json = serde_json::to_string(&response).expect("serialize failed");
    let back: Response = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(response, back);
}

#[test]
fn deleted_carries_cascade_count() {
    let response = Response::Deleted { cascade_count: 3 };
    let json = serde_json::to_value(&response).expect("serialize failed");
    assert_eq!(json["cascade_count"], 3);
}

#[test]
fn stopped_children_carries_count() {
    let response = Response::StoppedChildren { count: 2 };
    let json = serde_json::to_value(&response).expect("serialize failed");
    assert_eq!(json["count"], 2);
}

#[test]
fn aggregated_logs_round_trips_with_cursor() {
    let entry = LogEntryWire {
        job_id: "job-1".to_string(),
        sequence: 7,
        timestamp_epoch_ms: 5_000,
        display_time: "12:00:00".to_string(),
        level: "info".to_string(),
        message: "hello".to_string(),
    };
    let response = Response::AggregatedLogs {
        entries: vec![entry],
        next_cursor: Some("cursor-1".to_string()),
    };
    let json = serde_json::to_string(&response).expect("serialize failed");
    let back: Response = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(response, back);
}

#[test]
fn log_broadcast_round_trips() {
    let entry = LogEntryWire {
        job_id: "job-1".to_string(),
        sequence: 1,
        timestamp_epoch_ms: 1,
        display_time: "t".to_string(),
        level: "warn".to_string(),
        message: "careful".to_string(),
    };
    let response = Response::LogBroadcast { entry };
    let json = serde_json::to_string(&response).expect("serialize failed");
    let back: Response = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(response, back);
}

#[test]
fn error_response_carries_message() {
    let response = Response::Error {
        message: "not found".to_string(),
    };
    let json = serde_json::to_value(&response).expect("serialize failed");
    assert_eq!(json["type"], "Error");
    assert_eq!(json["message"], "not found");
}

use super::*;
use crate::job::JobKind;
use crate::log::LogLevel;

fn sample_config() -> JobConfig {
    JobConfig::builder(JobKind::CrawlerUrl)
        .id(JobId::from_string("job-test00000000000001"))
        .parent_id(JobId::none())
        .source_type("web")
        .entity_type("document")
        .build()
}

#[test]
fn job_id_resolves_for_job_scoped_events() {
    let config = sample_config();
    let id = config.id;
    let event = Event::JobCreated {
        config,
        created_at_epoch_ms: 1_000,
    };
    assert_eq!(event.job_id(), Some(&id));
}

#[test]
fn job_id_resolves_through_message_enqueued() {
    let job_id = JobId::new();
    let message = QueueMessage::new(job_id, JobId::none(), JobKind::CrawlerUrl, serde_json::json!("http://a"));
    let event = Event::MessageEnqueued {
        message,
        visible_at_epoch_ms: 42,
    };
    assert_eq!(event.job_id(), Some(&job_id));
}

#[test]
fn job_id_is_none_for_queue_only_events_without_a_job_id() {
    let event = Event::MessageDeleted {
        id: MessageId::new(),
    };
    assert_eq!(event.job_id(), None);
}

#[test]
fn summary_is_greppable_and_includes_the_id() {
    let id = JobId::from_string("job-test00000000000002");
    let event = Event::JobStatusChanged {
        id,
        status: JobStatus::Running,
        error: None,
        at_epoch_ms: 5,
    };
    let summary = event.summary();
    assert!(summary.contains("job_status_changed"));
    assert!(summary.contains(id.as_str()));
    assert!(summary.contains("running"));
}

#[test]
fn logs_appended_summary_reports_the_batch_count() {
    let job_id = JobId::new();
    let records = vec![LogRecord {
        job_id,
        sequence: 1,
        timestamp_epoch_ms: 1,
        level: LogLevel::Info,
        message: "hello".to_string(),
        fields: Default::default(),
    }];
    let event = Event::LogsAppended { job_id, records };
    assert_eq!(event.summary(), "logs_appended job=".to_string() + job_id.as_str() + " count=1");
}

#[test]
fn event_round_trips_through_json() {
    let event = Event::JobTotalSet {
        id: JobId::new(),
        total: 10,
    };
    let json = serde_json::to_string(&event).unwrap_or_else(|e| panic!("{e}"));
    let decoded: Event = serde_json::from_str(&json).unwrap_or_else(|e| panic!("{e}"));
    match decoded {
        Event::JobTotalSet { total, .. } => assert_eq!(total, 10),
        other => panic!("unexpected variant: {other:?}"),
    }
}

use super::*;

mod logs;
mod queue;
mod urls;

use quaero_core::{Event, JobConfig, JobId, JobKind, JobStatus};

fn create_event(id: &str, kind: JobKind) -> Event {
    Event::JobCreated {
        config: JobConfig::builder(kind)
            .id(JobId::from_string(id))
            .parent_id(JobId::none())
            .source_type("web")
            .entity_type("document")
            .build(),
        created_at_epoch_ms: 1_000,
    }
}

#[test]
fn apply_event_job_created_is_idempotent() {
    let mut state = MaterializedState::default();
    let event = create_event("job-test00000000000001", JobKind::CrawlerUrl);
    state.apply_event(&event);
    state.apply_event(&event);

    assert_eq!(state.jobs.len(), 1);
    assert!(state.jobs.contains_key("job-test00000000000001"));
}

#[test]
fn total_is_set_once_and_later_events_are_ignored() {
    let mut state = MaterializedState::default();
    let id = "job-test00000000000002";
    state.apply_event(&create_event(id, JobKind::Parent));
    state.apply_event(&Event::JobTotalSet {
        id: JobId::from_string(id),
        total: 10,
    });
    state.apply_event(&Event::JobTotalSet {
        id: JobId::from_string(id),
        total: 999,
    });

    assert_eq!(state.jobs[id].progress.total, 10);
}

#[test]
fn progress_deltas_accumulate() {
    let mut state = MaterializedState::default();
    let id = "job-test00000000000003";
    state.apply_event(&create_event(id, JobKind::Parent));
    state.apply_event(&Event::JobTotalSet {
        id: JobId::from_string(id),
        total: 10,
    });
    state.apply_event(&Event::JobProgressDelta {
        id: JobId::from_string(id),
        delta_completed: 3,
        delta_failed: 1,
    });
    state.apply_event(&Event::JobProgressDelta {
        id: JobId::from_string(id),
        delta_completed: 2,
        delta_failed: 0,
    });

    let progress = state.jobs[id].progress;
    assert_eq!(progress.completed, 5);
    assert_eq!(progress.failed, 1);
    assert_eq!(progress.pending(), 4);
}

#[test]
fn status_changed_sets_started_and_finished_timestamps() {
    let mut state = MaterializedState::default();
    let id = "job-test00000000000004";
    state.apply_event(&create_event(id, JobKind::CrawlerUrl));

    state.apply_event(&Event::JobStatusChanged {
        id: JobId::from_string(id),
        status: JobStatus::Running,
        error: None,
        at_epoch_ms: 2_000,
    });
    assert_eq!(state.jobs[id].started_at_epoch_ms, Some(2_000));
    assert!(state.jobs[id].finished_at_epoch_ms.is_none());

    state.apply_event(&Event::JobStatusChanged {
        id: JobId::from_string(id),
        status: JobStatus::Failed,
        error: Some("Network: timed out".to_string()),
        at_epoch_ms: 3_000,
    });
    assert_eq!(state.jobs[id].status, JobStatus::Failed);
    assert_eq!(state.jobs[id].finished_at_epoch_ms, Some(3_000));
    assert_eq!(state.jobs[id].error.as_deref(), Some("Network: timed out"));
}

#[test]
fn heartbeat_is_ignored_once_a_job_is_terminal() {
    let mut state = MaterializedState::default();
    let id = "job-test00000000000005";
    state.apply_event(&create_event(id, JobKind::CrawlerUrl));
    state.apply_event(&Event::JobStatusChanged {
        id: JobId::from_string(id),
        status: JobStatus::Completed,
        error: None,
        at_epoch_ms: 1_500,
    });

    state.apply_event(&Event::JobHeartbeat {
        id: JobId::from_string(id),
        at_epoch_ms: 9_999,
    });

    assert!(state.jobs[id].last_heartbeat_epoch_ms.is_none());
}

#[test]
fn running_jobs_marked_pending_only_affects_running_jobs() {
    let mut state = MaterializedState::default();
    let running = "job-test00000000000006";
    let pending = "job-test00000000000007";
    state.apply_event(&create_event(running, JobKind::CrawlerUrl));
    state.apply_event(&create_event(pending, JobKind::CrawlerUrl));
    state.apply_event(&Event::JobStatusChanged {
        id: JobId::from_string(running),
        status: JobStatus::Running,
        error: None,
        at_epoch_ms: 1_000,
    });

    state.apply_event(&Event::RunningJobsMarkedPending {
        ids: vec![JobId::from_string(running), JobId::from_string(pending)],
        at_epoch_ms: 2_000,
    });

    assert_eq!(state.jobs[running].status, JobStatus::Pending);
    assert_eq!(state.jobs[pending].status, JobStatus::Pending);
}

#[test]
fn jobs_deleted_cascades_logs_and_seen_urls() {
    let mut state = MaterializedState::default();
    let id = "job-test00000000000008";
    state.apply_event(&create_event(id, JobKind::CrawlerUrl));
    state.apply_event(&Event::UrlSeen {
        job_id: JobId::from_string(id),
        url_hash: "abc".to_string(),
    });

    state.apply_event(&Event::JobsDeleted {
        ids: vec![JobId::from_string(id)],
    });

    assert!(!state.jobs.contains_key(id));
    assert!(!state.seen_urls.contains_key(id));
}

#[test]
fn get_job_resolves_exact_id_and_unique_suffix() {
    let mut state = MaterializedState::default();
    let id = "job-abc1230000000000001";
    state.apply_event(&create_event(id, JobKind::CrawlerUrl));

    assert!(state.get_job(id).is_some());
    assert!(state.get_job("abc12300000000000001").is_some());
    assert!(state.get_job("job-nonexistent00000001").is_none());
}

#[test]
fn get_job_ambiguous_suffix_returns_none() {
    let mut state = MaterializedState::default();
    state.apply_event(&create_event("job-aaa000000000000000a", JobKind::CrawlerUrl));
    state.apply_event(&create_event("job-bbb000000000000000a", JobKind::CrawlerUrl));

    // Both ids end in "00000000000000a" — an ambiguous suffix resolves to nothing.
    assert!(state.get_job("00000000000000a").is_none());
    // Exact lookups are unaffected by the ambiguity.
    assert!(state.get_job("job-aaa000000000000000a").is_some());
}

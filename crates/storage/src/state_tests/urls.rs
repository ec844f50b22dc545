use super::*;
use quaero_core::JobId;

#[test]
fn a_seen_url_is_reported_as_seen() {
    let mut state = MaterializedState::default();
    let job_id = "job-test00000000000011";
    state.apply_event(&Event::UrlSeen {
        job_id: JobId::from_string(job_id),
        url_hash: "abc123".to_string(),
    });

    assert!(state.has_seen_url(job_id, "abc123"));
    assert!(!state.has_seen_url(job_id, "other"));
}

#[test]
fn seen_urls_are_scoped_per_job() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::UrlSeen {
        job_id: JobId::from_string("job-test00000000000012"),
        url_hash: "shared".to_string(),
    });

    assert!(state.has_seen_url("job-test00000000000012", "shared"));
    assert!(!state.has_seen_url("job-test00000000000013", "shared"));
}

#[test]
fn marking_the_same_url_twice_is_idempotent() {
    let mut state = MaterializedState::default();
    let job_id = "job-test00000000000014";
    state.apply_event(&Event::UrlSeen {
        job_id: JobId::from_string(job_id),
        url_hash: "dup".to_string(),
    });
    state.apply_event(&Event::UrlSeen {
        job_id: JobId::from_string(job_id),
        url_hash: "dup".to_string(),
    });

    assert_eq!(state.seen_urls.get(job_id).unwrap().len(), 1);
}

#[test]
fn unknown_job_has_not_seen_any_url() {
    let state = MaterializedState::default();
    assert!(!state.has_seen_url("job-nonexistent00000001", "anything"));
}

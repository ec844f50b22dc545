use super::*;
use quaero_core::{JobConfig, JobId, JobKind};
use tempfile::tempdir;

fn sample_state() -> MaterializedState {
    let mut state = MaterializedState::default();
    let config = JobConfig::builder(JobKind::CrawlerUrl)
        .id(JobId::from_string("job-test00000000000001"))
        .parent_id(JobId::none())
        .source_type("web")
        .entity_type("document")
        .build();
    state.apply_event(&quaero_core::Event::JobCreated {
        config,
        created_at_epoch_ms: 1_000,
    });
    state
}

#[test]
fn save_and_load_round_trips_the_state() {
    let dir = tempdir().unwrap_or_else(|e| panic!("{e}"));
    let path = dir.path().join("snapshot.bin");
    let snapshot = Snapshot::new(42, sample_state(), Utc::now());
    snapshot.save(&path).unwrap_or_else(|e| panic!("{e}"));

    let loaded = Snapshot::load(&path).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(loaded.seq, 42);
    assert_eq!(loaded.version, CURRENT_SNAPSHOT_VERSION);
    assert!(loaded.state.jobs.contains_key("job-test00000000000001"));
}

#[test]
fn saving_twice_rotates_the_previous_file_into_bak() {
    let dir = tempdir().unwrap_or_else(|e| panic!("{e}"));
    let path = dir.path().join("snapshot.bin");
    Snapshot::new(1, sample_state(), Utc::now())
        .save(&path)
        .unwrap_or_else(|e| panic!("{e}"));
    Snapshot::new(2, sample_state(), Utc::now())
        .save(&path)
        .unwrap_or_else(|e| panic!("{e}"));

    assert!(path.with_extension("bak").exists());
    let loaded = Snapshot::load(&path).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(loaded.seq, 2);
}

#[test]
fn loading_a_future_version_fails() {
    let dir = tempdir().unwrap_or_else(|e| panic!("{e}"));
    let path = dir.path().join("snapshot.bin");
    let mut snapshot = Snapshot::new(1, sample_state(), Utc::now());
    snapshot.version = CURRENT_SNAPSHOT_VERSION + 1;
    snapshot.save(&path).unwrap_or_else(|e| panic!("{e}"));

    let err = Snapshot::load(&path).unwrap_err();
    assert!(matches!(err, SnapshotError::UnsupportedVersion(_)));
}

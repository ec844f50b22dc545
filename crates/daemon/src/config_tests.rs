use super::*;
use tempfile::tempdir;

#[test]
fn load_engine_config_defaults_when_file_missing() {
    let dir = tempdir().expect("tempdir failed");
    let path = dir.path().join("does-not-exist.toml");

    let config = load_engine_config(&path).expect("missing file should default");
    assert_eq!(config.queue.concurrency, 5);
    assert_eq!(config.database_path, "quaero.wal");
}

#[test]
fn load_engine_config_parses_recognized_keys() {
    let dir = tempdir().expect("tempdir failed");
    let path = dir.path().join("quaero.toml");
    std::fs::write(
        &path,
        r#"
        stall_threshold = 600
        database_path = "custom.wal"

        [queue]
        concurrency = 10
        max_receive = 7

        [log]
        batch_size = 50
        "#,
    )
    .expect("write failed");

    let config = load_engine_config(&path).expect("parse failed");
    assert_eq!(config.queue.concurrency, 10);
    assert_eq!(config.queue.max_receive, 7);
    assert_eq!(config.log.batch_size, 50);
    assert_eq!(config.database_path, "custom.wal");
    assert_eq!(config.stall_threshold, std::time::Duration::from_secs(600));
}

#[test]
fn load_engine_config_rejects_malformed_toml() {
    let dir = tempdir().expect("tempdir failed");
    let path = dir.path().join("quaero.toml");
    std::fs::write(&path, "this is not [ toml").expect("write failed");

    let result = load_engine_config(&path);
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn socket_path_derived_from_database_path() {
    assert_eq!(socket_path_for("quaero.wal"), PathBuf::from("quaero.sock"));
    assert_eq!(
        socket_path_for("/var/lib/quaero/quaero.wal"),
        PathBuf::from("/var/lib/quaero/quaero.sock")
    );
}

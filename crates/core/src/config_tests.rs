use super::*;

#[test]
fn empty_config_file_uses_spec_defaults() {
    let config = EngineConfig::from_toml_str("").unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(config.queue.poll_interval, Duration::from_secs(1));
    assert_eq!(config.queue.concurrency, 5);
    assert_eq!(config.queue.visibility_timeout, Duration::from_secs(300));
    assert_eq!(config.queue.max_receive, 3);
    assert_eq!(config.stall_threshold, Duration::from_secs(900));
    assert_eq!(config.log.batch_size, 100);
    assert_eq!(config.log.batch_interval, Duration::from_secs(1));
}

#[test]
fn partial_overrides_only_change_the_named_field() {
    let toml = r#"
        [queue]
        concurrency = 10
    "#;
    let config = EngineConfig::from_toml_str(toml).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(config.queue.concurrency, 10);
    assert_eq!(config.queue.max_receive, 3);
}

#[test]
fn full_override_of_every_recognized_key() {
    let toml = r#"
        stall_threshold = 120
        database_path = "/tmp/q.wal"

        [queue]
        poll_interval = 2
        concurrency = 8
        visibility_timeout = 60
        max_receive = 5
        queue_name = "ingest"

        [log]
        batch_size = 50
        batch_interval = 2
    "#;
    let config = EngineConfig::from_toml_str(toml).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(config.queue.poll_interval, Duration::from_secs(2));
    assert_eq!(config.queue.concurrency, 8);
    assert_eq!(config.queue.visibility_timeout, Duration::from_secs(60));
    assert_eq!(config.queue.max_receive, 5);
    assert_eq!(config.queue.queue_name, "ingest");
    assert_eq!(config.log.batch_size, 50);
    assert_eq!(config.log.batch_interval, Duration::from_secs(2));
    assert_eq!(config.stall_threshold, Duration::from_secs(120));
    assert_eq!(config.database_path, "/tmp/q.wal");
}

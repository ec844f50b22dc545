use super::*;

#[test]
fn timeout_round_trips_through_json_as_seconds() {
    let definition = JobDefinition {
        id: "def-crawl".to_string(),
        name: "crawl and summarize".to_string(),
        kind: "web".to_string(),
        timeout: std::time::Duration::from_secs(120),
        steps: vec![Step {
            name: "crawl".to_string(),
            action: "crawl".to_string(),
            config: serde_json::json!({ "seed_urls": ["http://a", "http://b"] }),
            on_error: OnError::Fail,
        }],
    };

    let raw = serde_json::to_value(&definition).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(raw["timeout"], serde_json::json!(120));

    let parsed: JobDefinition = serde_json::from_value(raw).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(parsed.timeout, definition.timeout);
    assert_eq!(parsed.steps.len(), 1);
    assert_eq!(parsed.steps[0].on_error, OnError::Fail);
}

#[test]
fn on_error_serializes_as_snake_case() {
    assert_eq!(serde_json::to_value(OnError::Continue).unwrap_or_else(|e| panic!("{e}")), serde_json::json!("continue"));
    assert_eq!(serde_json::to_value(OnError::Fail).unwrap_or_else(|e| panic!("{e}")), serde_json::json!("fail"));
}

#[test]
fn step_config_defaults_to_null_when_omitted() {
    let raw = serde_json::json!({
        "name": "crawl",
        "action": "crawl",
        "on_error": "fail",
    });
    let step: Step = serde_json::from_value(raw).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(step.config, serde_json::Value::Null);
}

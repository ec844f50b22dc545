use super::*;
use quaero_core::{FakeClock, JobConfig, JobKind};
use quaero_storage::Store;
use tempfile::tempdir;

use crate::step_executor::StepContext;

fn open_store() -> (tempfile::TempDir, std::sync::Arc<Store<FakeClock>>) {
    let dir = tempdir().unwrap_or_else(|e| panic!("{e}"));
    let store = Store::open(dir.path().join("test.wal"), FakeClock::new()).unwrap_or_else(|e| panic!("{e}"));
    (dir, std::sync::Arc::new(store))
}

fn step_with_seed_urls(urls: &[&str]) -> crate::job_definition::Step {
    crate::job_definition::Step {
        name: "crawl".to_string(),
        action: "crawl".to_string(),
        config: serde_json::json!({ "seed_urls": urls }),
        on_error: crate::job_definition::OnError::Fail,
    }
}

#[tokio::test]
async fn expand_creates_one_child_per_seed_url() {
    let (_dir, store) = open_store();
    let parent = store
        .create_job(JobConfig::builder(JobKind::Parent).source_type("news").entity_type("article").build())
        .unwrap_or_else(|e| panic!("{e}"));

    let ctx = StepContext {
        store: std::sync::Arc::clone(&store),
        parent_id: parent.id,
        step: step_with_seed_urls(&["http://a", "http://b"]),
    };

    let children = CrawlStepExecutor.expand(&ctx).await.unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(children.len(), 2);
    assert_eq!(store.queue_length(), 2);

    for child_id in &children {
        let child = store.get_job(child_id.as_str()).unwrap_or_else(|| panic!("child missing"));
        assert_eq!(child.kind, JobKind::CrawlerUrl);
        assert_eq!(child.parent_id, parent.id);
        assert_eq!(child.source_type, "news");
        assert_eq!(child.entity_type, "article");
    }
}

#[tokio::test]
async fn expand_dedupes_already_seen_urls() {
    let (_dir, store) = open_store();
    let parent = store
        .create_job(JobConfig::builder(JobKind::Parent).source_type("web").entity_type("document").build())
        .unwrap_or_else(|e| panic!("{e}"));
    store.mark_url_seen(parent.id, "http://a").unwrap_or_else(|e| panic!("{e}"));

    let ctx = StepContext {
        store: std::sync::Arc::clone(&store),
        parent_id: parent.id,
        step: step_with_seed_urls(&["http://a", "http://b"]),
    };

    let children = CrawlStepExecutor.expand(&ctx).await.unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(children.len(), 1);
}

#[tokio::test]
async fn expand_rejects_a_step_with_no_seed_urls() {
    let (_dir, store) = open_store();
    let parent = store
        .create_job(JobConfig::builder(JobKind::Parent).source_type("web").entity_type("document").build())
        .unwrap_or_else(|e| panic!("{e}"));

    let ctx = StepContext {
        store: std::sync::Arc::clone(&store),
        parent_id: parent.id,
        step: step_with_seed_urls(&[]),
    };

    assert!(CrawlStepExecutor.expand(&ctx).await.is_err());
}

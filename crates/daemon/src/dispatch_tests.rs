use super::*;
use quaero_core::{FakeClock, JobConfig, JobKind, JobStatus};
use quaero_engine::builtin::CrawlStepExecutor;
use quaero_engine::StepExecutorRegistry;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

fn test_ctx() -> (tempfile::TempDir, DispatchCtx<FakeClock>) {
    let dir = tempdir().unwrap_or_else(|e| panic!("{e}"));
    let clock = FakeClock::new();
    let store = Arc::new(Store::open(dir.path().join("test.wal"), clock.clone()).unwrap_or_else(|e| panic!("{e}")));

    let mut step_executors = StepExecutorRegistry::new();
    step_executors.register(Arc::new(CrawlStepExecutor)).unwrap_or_else(|e| panic!("{e}"));
    let executor = Arc::new(JobDefinitionExecutor::new(Arc::clone(&store), Arc::new(step_executors), clock));

    let logs = Arc::new(LogPipeline::spawn(
        Arc::clone(&store),
        quaero_core::LogConfig::default(),
        CancellationToken::new(),
    ));

    let ctx = DispatchCtx {
        store,
        executor,
        logs,
        job_timeout: Duration::from_secs(60),
    };
    (dir, ctx)
}

#[tokio::test]
async fn create_job_returns_an_id_immediately_and_expands_seed_urls_in_the_background() {
    let (_dir, ctx) = test_ctx();

    let response = dispatch(
        &ctx,
        ClientMessage::Request(Request::CreateJob {
            source_type: "web".to_string(),
            entity_type: "page".to_string(),
            config: serde_json::json!({ "seed_urls": ["http://a", "http://b"] }),
        }),
    )
    .await;

    let id = match response {
        Response::JobCreated { id } => id,
        other => panic!("expected JobCreated, got {other:?}"),
    };

    let parent = ctx.store.get_job(&id).unwrap_or_else(|| panic!("parent missing"));
    assert_eq!(parent.kind, JobKind::Parent);
    assert_eq!(parent.status, JobStatus::Running);

    for _ in 0..200 {
        let children = ctx.store.list_jobs(&quaero_core::JobFilter {
            parent_id: Some(quaero_core::JobId::from_string(&id)),
            ..Default::default()
        });
        if children.len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let children = ctx.store.list_jobs(&quaero_core::JobFilter {
        parent_id: Some(quaero_core::JobId::from_string(&id)),
        ..Default::default()
    });
    assert_eq!(children.len(), 2);
}

#[tokio::test]
async fn get_job_returns_none_for_an_unknown_id() {
    let (_dir, ctx) = test_ctx();
    let response = dispatch(&ctx, ClientMessage::Query(Query::GetJob { id: "job-missing".to_string() })).await;
    assert!(matches!(response, Response::Job { job: None }));
}

#[tokio::test]
async fn get_job_returns_a_summary_for_a_known_job() {
    let (_dir, ctx) = test_ctx();
    let job = ctx
        .store
        .create_job(JobConfig::builder(JobKind::CrawlerUrl).source_type("web").entity_type("page").build())
        .unwrap_or_else(|e| panic!("{e}"));

    let response = dispatch(&ctx, ClientMessage::Query(Query::GetJob { id: job.id.to_string() })).await;
    match response {
        Response::Job { job: Some(summary) } => assert_eq!(summary.id, job.id.to_string()),
        other => panic!("expected Job(Some), got {other:?}"),
    }
}

#[tokio::test]
async fn list_jobs_rejects_an_unknown_status_in_the_filter() {
    let (_dir, ctx) = test_ctx();
    let response = dispatch(
        &ctx,
        ClientMessage::Query(Query::ListJobs {
            filter: quaero_wire::JobFilterWire {
                statuses: vec!["not-a-status".to_string()],
                ..Default::default()
            },
        }),
    )
    .await;
    assert!(matches!(response, Response::Error { .. }));
}

#[tokio::test]
async fn delete_job_cascades_and_reports_the_count() {
    let (_dir, ctx) = test_ctx();
    let parent = ctx
        .store
        .create_job(JobConfig::builder(JobKind::Parent).source_type("web").entity_type("page").build())
        .unwrap_or_else(|e| panic!("{e}"));
    ctx.store
        .create_job(
            JobConfig::builder(JobKind::CrawlerUrl)
                .parent_id(parent.id)
                .source_type("web")
                .entity_type("page")
                .build(),
        )
        .unwrap_or_else(|e| panic!("{e}"));

    let response = dispatch(&ctx, ClientMessage::Request(Request::DeleteJob { id: parent.id.to_string() })).await;
    assert!(matches!(response, Response::Deleted { cascade_count: 1 }));
    assert!(ctx.store.get_job(parent.id.as_str()).is_none());
}

#[tokio::test]
async fn copy_job_returns_a_new_id() {
    let (_dir, ctx) = test_ctx();
    let job = ctx
        .store
        .create_job(JobConfig::builder(JobKind::CrawlerUrl).source_type("web").entity_type("page").build())
        .unwrap_or_else(|e| panic!("{e}"));

    let response = dispatch(&ctx, ClientMessage::Request(Request::CopyJob { id: job.id.to_string() })).await;
    match response {
        Response::Copied { id } => assert_ne!(id, job.id.to_string()),
        other => panic!("expected Copied, got {other:?}"),
    }
}

#[tokio::test]
async fn stop_all_child_jobs_counts_non_terminal_children() {
    let (_dir, ctx) = test_ctx();
    let parent = ctx
        .store
        .create_job(JobConfig::builder(JobKind::Parent).source_type("web").entity_type("page").build())
        .unwrap_or_else(|e| panic!("{e}"));
    let child = ctx
        .store
        .create_job(
            JobConfig::builder(JobKind::CrawlerUrl)
                .parent_id(parent.id)
                .source_type("web")
                .entity_type("page")
                .build(),
        )
        .unwrap_or_else(|e| panic!("{e}"));
    ctx.store.update_job_status(child.id, JobStatus::Running, None).unwrap_or_else(|e| panic!("{e}"));

    let response =
        dispatch(&ctx, ClientMessage::Request(Request::StopAllChildJobs { parent_id: parent.id.to_string() })).await;
    assert!(matches!(response, Response::StoppedChildren { count: 1 }));
}

#[tokio::test]
async fn get_aggregated_logs_rejects_an_unknown_direction() {
    let (_dir, ctx) = test_ctx();
    let response = dispatch(
        &ctx,
        ClientMessage::Query(Query::GetAggregatedLogs {
            parent_id: "job-parent".to_string(),
            limit: 10,
            direction: "sideways".to_string(),
            level_filter: None,
            cursor: None,
        }),
    )
    .await;
    assert!(matches!(response, Response::Error { .. }));
}

#[tokio::test]
async fn get_aggregated_logs_returns_an_empty_page_for_a_job_with_no_logs() {
    let (_dir, ctx) = test_ctx();
    let job = ctx
        .store
        .create_job(JobConfig::builder(JobKind::Parent).source_type("web").entity_type("page").build())
        .unwrap_or_else(|e| panic!("{e}"));

    let response = dispatch(
        &ctx,
        ClientMessage::Query(Query::GetAggregatedLogs {
            parent_id: job.id.to_string(),
            limit: 10,
            direction: "asc".to_string(),
            level_filter: None,
            cursor: None,
        }),
    )
    .await;
    match response {
        Response::AggregatedLogs { entries, next_cursor } => {
            assert!(entries.is_empty());
            assert!(next_cursor.is_none());
        }
        other => panic!("expected AggregatedLogs, got {other:?}"),
    }
}

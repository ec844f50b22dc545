//! Translates one [`quaero_wire::ClientMessage`] into calls against the
//! engine and storage layers and turns the result back into a
//! [`quaero_wire::Response`] (spec section 6, the job-management API and
//! the aggregated log read).
//!
//! `CreateJob` has no notion of a job definition on the wire — it is the
//! one caller-facing entry point for the crawl scenario (spec section 8,
//! scenario 1), so it always runs the built-in `"crawl"` step against a
//! freshly created parent job and hands back the parent's id as soon as
//! it exists, per [`quaero_engine::JobDefinitionExecutor::spawn`].

use std::sync::Arc;
use std::time::Duration;

use quaero_core::Clock;
use quaero_engine::{Direction, JobDefinition, JobDefinitionExecutor, LogPipeline, OnError, Step};
use quaero_storage::Store;
use quaero_wire::{ClientMessage, JobSummary, LogEntryWire, Query, Request, Response};

const CRAWL_STEP_ACTION: &str = "crawl";

/// Everything [`dispatch`] needs per connection. Cheap to clone — every
/// field is an `Arc` (or, for the definition timeout, a `Copy` value).
pub struct DispatchCtx<C: Clock> {
    pub store: Arc<Store<C>>,
    pub executor: Arc<JobDefinitionExecutor<C>>,
    pub logs: Arc<LogPipeline<C>>,
    /// Deadline handed to the single ad hoc `"crawl"` step a `CreateJob`
    /// call runs, mirroring `engine.stall_threshold` (spec section 6).
    pub job_timeout: Duration,
}

impl<C: Clock> Clone for DispatchCtx<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            executor: Arc::clone(&self.executor),
            logs: Arc::clone(&self.logs),
            job_timeout: self.job_timeout,
        }
    }
}

pub async fn dispatch<C: Clock + 'static>(ctx: &DispatchCtx<C>, message: ClientMessage) -> Response {
    match message {
        ClientMessage::Request(request) => handle_request(ctx, request).await,
        ClientMessage::Query(query) => handle_query(ctx, query),
    }
}

async fn handle_request<C: Clock + 'static>(ctx: &DispatchCtx<C>, request: Request) -> Response {
    match request {
        Request::CreateJob {
            source_type,
            entity_type,
            config,
        } => create_job(ctx, source_type, entity_type, config).await,

        Request::DeleteJob { id } => match ctx.store.delete_job(quaero_core::JobId::from_string(&id)) {
            Ok(cascade_count) => Response::Deleted { cascade_count },
            Err(error) => Response::Error { message: error.to_string() },
        },

        Request::CopyJob { id } => match ctx.store.copy_job(quaero_core::JobId::from_string(&id)) {
            Ok(copy) => Response::Copied { id: copy.id.to_string() },
            Err(error) => Response::Error { message: error.to_string() },
        },

        Request::StopAllChildJobs { parent_id } => {
            match ctx.store.stop_all_child_jobs(
                quaero_core::JobId::from_string(&parent_id),
                "Cancelled by StopAllChildJobs",
            ) {
                Ok(count) => Response::StoppedChildren { count },
                Err(error) => Response::Error { message: error.to_string() },
            }
        }
    }
}

/// `CreateJob(sourceType, entityType, config) -> id`. Wraps `config` in a
/// single `"crawl"` step of an ad hoc job definition and hands the whole
/// thing to the executor, which returns the parent id once it exists and
/// finishes expanding/running children in the background.
async fn create_job<C: Clock + 'static>(
    ctx: &DispatchCtx<C>,
    source_type: String,
    entity_type: String,
    config: serde_json::Value,
) -> Response {
    let definition = JobDefinition {
        id: format!("adhoc-{source_type}"),
        name: "CreateJob".to_string(),
        kind: source_type.clone(),
        timeout: ctx.job_timeout,
        steps: vec![Step {
            name: CRAWL_STEP_ACTION.to_string(),
            action: CRAWL_STEP_ACTION.to_string(),
            config: config.clone(),
            on_error: OnError::Continue,
        }],
    };

    match ctx.executor.spawn(definition, &source_type, &entity_type, config).await {
        Ok(id) => Response::JobCreated { id: id.to_string() },
        Err(error) => Response::Error { message: error.to_string() },
    }
}

fn handle_query<C: Clock>(ctx: &DispatchCtx<C>, query: Query) -> Response {
    match query {
        Query::ListJobs { filter } => match filter.into_filter() {
            Ok(filter) => {
                let jobs = ctx.store.list_jobs(&filter).iter().map(JobSummary::from).collect();
                Response::Jobs { jobs }
            }
            Err(message) => Response::Error { message },
        },

        Query::GetJob { id } => Response::Job {
            job: ctx.store.get_job(&id).as_ref().map(JobSummary::from).map(Box::new),
        },

        Query::GetAggregatedLogs {
            parent_id,
            limit,
            direction,
            level_filter,
            cursor,
        } => get_aggregated_logs(ctx, &parent_id, limit, &direction, level_filter.as_deref(), cursor.as_deref()),
    }
}

fn get_aggregated_logs<C: Clock>(
    ctx: &DispatchCtx<C>,
    parent_id: &str,
    limit: usize,
    direction: &str,
    level_filter: Option<&str>,
    cursor: Option<&str>,
) -> Response {
    let direction = match direction {
        "asc" => Direction::Ascending,
        "desc" => Direction::Descending,
        other => return Response::Error { message: format!("unknown log direction: {other}") },
    };

    let level_filter = match level_filter.map(str::parse) {
        Some(Ok(level)) => Some(level),
        Some(Err(_)) => return Response::Error { message: format!("unknown log level: {level_filter:?}") },
        None => None,
    };

    let cursor = match cursor.map(quaero_engine::Cursor::decode) {
        Some(Ok(cursor)) => Some(cursor),
        Some(Err(message)) => return Response::Error { message },
        None => None,
    };

    let page = ctx.logs.get_aggregated_logs(parent_id, limit, direction, level_filter, cursor.as_ref());
    Response::AggregatedLogs {
        entries: page.entries.iter().map(LogEntryWire::from).collect(),
        next_cursor: page.next_cursor,
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

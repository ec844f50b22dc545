//! `quaerod`: the daemon process. Opens the single durable store, wires
//! the built-in processors and step executors, starts the worker pool,
//! the log pipeline, and the Unix-socket listener, and shuts everything
//! down cleanly on SIGINT/SIGTERM (spec section 5: "one process-wide
//! root context; shutdown cancels it").

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod config;
mod dispatch;
mod listener;

use std::sync::Arc;

use quaero_core::SystemClock;
use quaero_engine::builtin::{AgentProcessor, CrawlStepExecutor, CrawlerUrlProcessor, SummarizerProcessor};
use quaero_engine::{JobDefinitionExecutor, LogPipeline, ProcessorRegistry, StepExecutorRegistry, WorkerPool};
use quaero_storage::Store;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use config::DaemonConfig;
use dispatch::DispatchCtx;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match DaemonConfig::load() {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let clock = SystemClock;
    let store = match Store::open(&config.engine.database_path, clock) {
        Ok(store) => Arc::new(store),
        Err(error) => {
            error!(%error, database_path = %config.engine.database_path, "failed to open store");
            std::process::exit(1);
        }
    };

    // Ungraceful-shutdown recovery (spec section 4.B): anything still
    // `running` from a previous process is demoted so the pool re-picks it.
    match store.mark_running_jobs_as_pending() {
        Ok(resumed) if !resumed.is_empty() => info!(count = resumed.len(), "resumed jobs left running at startup"),
        Ok(_) => {}
        Err(error) => error!(%error, "failed to demote running jobs at startup"),
    }

    let mut processors = ProcessorRegistry::new();
    let registrations = [
        processors.register(Arc::new(CrawlerUrlProcessor)),
        processors.register(Arc::new(AgentProcessor)),
        processors.register(Arc::new(SummarizerProcessor)),
    ];
    if let Some(Err(error)) = registrations.into_iter().find(Result::is_err) {
        error!(%error, "failed to register built-in processor");
        std::process::exit(1);
    }
    let processors = Arc::new(processors);

    let mut step_executors = StepExecutorRegistry::new();
    if let Err(error) = step_executors.register(Arc::new(CrawlStepExecutor)) {
        error!(%error, "failed to register built-in step executor");
        std::process::exit(1);
    }
    let step_executors = Arc::new(step_executors);

    let root_cancellation = CancellationToken::new();

    let logs = Arc::new(LogPipeline::spawn(
        Arc::clone(&store),
        config.engine.log.clone(),
        root_cancellation.clone(),
    ));

    let pool = WorkerPool::spawn(
        Arc::clone(&store),
        processors,
        logs.sink(),
        SystemClock,
        config.engine.queue.clone(),
        config.engine.stall_threshold,
    );

    let executor = Arc::new(JobDefinitionExecutor::new(Arc::clone(&store), step_executors, SystemClock));

    let dispatch_ctx = DispatchCtx {
        store: Arc::clone(&store),
        executor,
        logs: Arc::clone(&logs),
        job_timeout: config.engine.stall_threshold,
    };

    if config.socket_path.exists() {
        if let Err(error) = std::fs::remove_file(&config.socket_path) {
            warn!(%error, path = ?config.socket_path, "failed to remove stale socket");
        }
    }
    let unix_listener = match UnixListener::bind(&config.socket_path) {
        Ok(listener) => listener,
        Err(error) => {
            error!(%error, path = ?config.socket_path, "failed to bind socket");
            std::process::exit(1);
        }
    };
    info!(path = ?config.socket_path, "listening");

    let listener_handle =
        tokio::spawn(listener::run(unix_listener, dispatch_ctx, root_cancellation.clone()));

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, draining");

    root_cancellation.cancel();
    let _ = listener_handle.await;
    pool.shutdown().await;

    if let Err(error) = store.checkpoint() {
        error!(%error, "failed to checkpoint store on shutdown");
    }
    let _ = std::fs::remove_file(&config.socket_path);
    info!("shutdown complete");
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(signal) => signal,
        Err(error) => {
            error!(%error, "failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

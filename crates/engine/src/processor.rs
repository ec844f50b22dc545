//! The processor interface (spec 4.D): one processor per [`JobKind`],
//! registered exactly once, validated then executed for every message the
//! pool receives of that kind.

use async_trait::async_trait;
use quaero_core::{Job, JobKind};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::log_pipeline::LogSink;

/// Everything a processor needs to do its work without reaching into the
/// store directly: the store itself (for children it spawns), a log
/// sink, and a cancellation token the pool trips on shutdown.
#[derive(Clone)]
pub struct ProcessorContext<C: quaero_core::Clock> {
    pub store: Arc<quaero_storage::Store<C>>,
    pub logs: LogSink,
    pub cancellation: CancellationToken,
    pub clock: C,
}

/// Outcome of a successful `execute`. `result` is stored verbatim on the
/// job (spec section 3, `Job::result`); `spawned` lets a processor hand
/// back queue messages for the pool to enqueue atomically alongside the
/// job's own completion, rather than enqueueing mid-execution.
#[derive(Debug, Clone, Default)]
pub struct ProcessorOutcome {
    pub result: Option<serde_json::Value>,
}

impl ProcessorOutcome {
    pub fn with_result(result: serde_json::Value) -> Self {
        Self {
            result: Some(result),
        }
    }
}

/// A unit of work for exactly one [`JobKind`]. Errors returned by
/// `validate`/`execute` must already be in the `Category: description`
/// shape (spec section 7) — the pool never invents one on a processor's
/// behalf, only propagates what comes back.
#[async_trait]
pub trait Processor<C: quaero_core::Clock>: Send + Sync {
    fn kind(&self) -> JobKind;

    /// Cheap, synchronous-feeling precondition check run before the job
    /// transitions to `running`. Returning `Err` fails the job without
    /// ever starting it.
    async fn validate(&self, job: &Job) -> Result<(), String>;

    async fn execute(
        &self,
        ctx: ProcessorContext<C>,
        job: &Job,
    ) -> Result<ProcessorOutcome, String>;
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;

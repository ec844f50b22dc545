//! The engine: the worker pool and processor contract (spec 4.D), the
//! job-definition executor (spec 4.E), and the log pipeline (spec 4.C),
//! all built on top of `quaero_storage::Store`.
//!
//! Nothing in this crate opens a socket or parses a config file — that
//! ambient wiring belongs to `quaero-daemon`. This crate only assumes an
//! already-open `Store` and a `tokio` runtime.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod builtin;
pub mod error;
pub mod executor;
pub mod job_definition;
pub mod log_pipeline;
pub mod pool;
pub mod processor;
pub mod registry;
pub mod step_executor;

pub use error::EngineError;
pub use executor::JobDefinitionExecutor;
pub use job_definition::{JobDefinition, OnError, Step};
pub use log_pipeline::{AggregatedLogsPage, Cursor, Direction, LogPipeline, LogSink};
pub use pool::WorkerPool;
pub use processor::{Processor, ProcessorContext, ProcessorOutcome};
pub use registry::{ProcessorRegistry, StepExecutorRegistry};
pub use step_executor::{StepContext, StepExecutor};

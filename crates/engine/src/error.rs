//! Internal engine errors. These are distinct from the `Category:
//! description` job-visible error string (spec section 7) — that shape
//! is only applied at the boundary where a processor or step executor's
//! outcome is written to a job's `error` field.

use quaero_core::JobId;
use quaero_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no processor registered for job kind {0}")]
    NoProcessor(quaero_core::JobKind),
    #[error("processor already registered for job kind {0}")]
    DuplicateProcessor(quaero_core::JobKind),
    #[error("no step executor registered for action {0:?}")]
    NoStepExecutor(String),
    #[error("step executor for action {action:?} failed to expand: {message}")]
    StepExpansion { action: String, message: String },
    #[error("step executor already registered for action {0:?}")]
    DuplicateStepExecutor(String),
    #[error("step {step:?} timed out waiting on children of job {parent}")]
    StepTimeout { step: String, parent: JobId },
    #[error("job definition {0:?} has no steps")]
    EmptyJobDefinition(String),
}

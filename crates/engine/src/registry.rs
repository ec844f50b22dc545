//! Processor and step-executor registries (spec section 4: "Processor
//! registry (exposed): `RegisterProcessor(kind, processor)` and, for the
//! job-definition executor, `RegisterStepExecutor(action, stepExecutor)`.
//! Called once at startup; duplicates are an error.").

use quaero_core::{Clock, JobKind};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::EngineError;
use crate::processor::Processor;
use crate::step_executor::StepExecutor;

/// One processor per [`JobKind`], populated once at startup.
pub struct ProcessorRegistry<C: Clock> {
    processors: HashMap<JobKind, Arc<dyn Processor<C>>>,
}

impl<C: Clock> ProcessorRegistry<C> {
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    pub fn register(&mut self, processor: Arc<dyn Processor<C>>) -> Result<(), EngineError> {
        let kind = processor.kind();
        if self.processors.contains_key(&kind) {
            return Err(EngineError::DuplicateProcessor(kind));
        }
        self.processors.insert(kind, processor);
        Ok(())
    }

    pub fn get(&self, kind: JobKind) -> Option<Arc<dyn Processor<C>>> {
        self.processors.get(&kind).cloned()
    }
}

impl<C: Clock> Default for ProcessorRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// One step executor per declarative-job-definition `action`.
pub struct StepExecutorRegistry<C: Clock> {
    executors: HashMap<String, Arc<dyn StepExecutor<C>>>,
}

impl<C: Clock> StepExecutorRegistry<C> {
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    pub fn register(&mut self, executor: Arc<dyn StepExecutor<C>>) -> Result<(), EngineError> {
        let action = executor.action().to_string();
        if self.executors.contains_key(&action) {
            return Err(EngineError::DuplicateStepExecutor(action));
        }
        self.executors.insert(action, executor);
        Ok(())
    }

    pub fn get(&self, action: &str) -> Option<Arc<dyn StepExecutor<C>>> {
        self.executors.get(action).cloned()
    }
}

impl<C: Clock> Default for StepExecutorRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

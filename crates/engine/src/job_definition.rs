//! The declarative shape of a job definition (spec 4.E): `{ id, name,
//! kind, timeout, steps: [ { name, action, config, on_error } ] }`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to a definition's remaining steps when a step's children
/// include at least one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnError {
    /// Roll the step's failure up to the parent and stop the definition.
    Fail,
    /// Record the failures in the step's child-stats and proceed to the
    /// next step regardless.
    Continue,
}

/// One step of a [`JobDefinition`]. `action` names a registered
/// [`crate::step_executor::StepExecutor`]; `config` is opaque to the
/// executor and interpreted only by that step executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub action: String,
    #[serde(default)]
    pub config: serde_json::Value,
    pub on_error: OnError,
}

/// A declarative multi-step job (spec 4.E). The executor runs `steps`
/// strictly in order; children within one step run concurrently, bounded
/// by pool concurrency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub id: String,
    pub name: String,
    pub kind: String,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub steps: Vec<Step>,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
#[path = "job_definition_tests.rs"]
mod tests;

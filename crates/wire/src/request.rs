//! Mutating calls of the job-management API (spec section 6):
//! `CreateJob`, `DeleteJob`, `CopyJob`, `StopAllChildJobs`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// `CreateJob(sourceType, entityType, config) -> id`.
    CreateJob {
        source_type: String,
        entity_type: String,
        #[serde(default)]
        config: serde_json::Value,
    },
    /// `DeleteJob(id) -> cascadeCount`.
    DeleteJob { id: String },
    /// `CopyJob(id) -> newID`.
    CopyJob { id: String },
    /// `StopAllChildJobs(parentID) -> count`.
    StopAllChildJobs { parent_id: String },
}

/// What a connection receives: either a mutating [`Request`] or a
/// read-only [`crate::Query`]. Untagged, since the two inner enums
/// already self-tag with disjoint `"type"` variant names — serde tries
/// each in turn and keeps whichever parses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ClientMessage {
    Request(Request),
    Query(crate::Query),
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

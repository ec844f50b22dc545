//! Read-only calls of the job-management API (spec section 6):
//! `ListJobs`, `GetJob`, and the aggregated log read (spec section 4.C).

use crate::types::JobFilterWire;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Query {
    ListJobs {
        #[serde(default)]
        filter: JobFilterWire,
    },
    GetJob {
        id: String,
    },
    /// `GetAggregatedLogs(parentId, limit, direction, levelFilter, cursor)`
    /// (spec section 4.C). `direction` is `"asc"` or `"desc"`.
    GetAggregatedLogs {
        parent_id: String,
        limit: usize,
        #[serde(default = "default_direction")]
        direction: String,
        #[serde(default)]
        level_filter: Option<String>,
        #[serde(default)]
        cursor: Option<String>,
    },
}

fn default_direction() -> String {
    "asc".to_string()
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;

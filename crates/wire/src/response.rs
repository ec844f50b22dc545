//! Responses to [`crate::Request`]/[`crate::Query`] calls, plus the
//! best-effort log-broadcast payload (spec section 6 "Log subscriber").

use crate::types::{JobSummary, LogEntryWire};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Ok,

    JobCreated {
        id: String,
    },
    Job {
        job: Option<Box<JobSummary>>,
    },
    Jobs {
        jobs: Vec<JobSummary>,
    },
    /// Result of `DeleteJob`: the number of children cascaded away (the
    /// parent itself is not counted, matching `Store::delete_job`).
    Deleted {
        cascade_count: usize,
    },
    Copied {
        id: String,
    },
    /// Result of `StopAllChildJobs`: the number of non-terminal children
    /// flipped to `cancelled`.
    StoppedChildren {
        count: usize,
    },
    AggregatedLogs {
        entries: Vec<LogEntryWire>,
        next_cursor: Option<String>,
    },

    /// A single broadcast log entry (spec section 6: `BroadcastLog`).
    /// Subscribers receive best-effort delivery; a lagged subscriber may
    /// miss entries rather than block the writer.
    LogBroadcast {
        entry: LogEntryWire,
    },

    Error {
        message: String,
    },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;

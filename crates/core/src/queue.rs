//! The envelope type carried on the durable queue (spec section 3,
//! `QueueMessage`). The queue itself — visibility timeout, receive
//! counting, dead-lettering — lives in `quaero-storage`; this module only
//! defines the wire-shape of a message.

use crate::job::{JobId, JobKind};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a queue message.
    pub struct MessageId("msg-");
}

/// An envelope on the durable queue. Produced by the job-definition
/// executor or by a processor spawning children; consumed once (at a
/// time) by the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMessage {
    pub id: MessageId,
    pub job_id: JobId,
    pub job_definition_id: Option<String>,
    pub parent_id: JobId,
    pub kind: JobKind,
    /// 0 for seed messages; incremented for messages a processor spawns
    /// from within another message's processing.
    pub depth: u32,
    pub config: serde_json::Value,
    /// Serialized payload (a URL, a document id, ...). Opaque to the
    /// queue and to the pool; only the processor for `kind` interprets it.
    pub body: serde_json::Value,
}

impl QueueMessage {
    pub fn new(job_id: JobId, parent_id: JobId, kind: JobKind, body: serde_json::Value) -> Self {
        Self {
            id: MessageId::new(),
            job_id,
            job_definition_id: None,
            parent_id,
            kind,
            depth: 0,
            config: serde_json::Value::Null,
            body,
        }
    }

    crate::setters! {
        set {
            depth: u32,
            config: serde_json::Value,
        }
        option {
            job_definition_id: String,
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

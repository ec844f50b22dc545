//! Structured log entries that flow through the log pipeline (spec
//! section 4.C). A job emits a [`LogEvent`]; the pipeline turns it into a
//! persisted [`LogRecord`] and a UI-facing [`DisplayLogEntry`].

use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

crate::simple_display! {
    LogLevel {
        Debug => "debug",
        Info => "info",
        Warn => "warn",
        Error => "error",
        Fatal => "fatal",
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// A log event as emitted by a producer (a processor, the pool, or the
/// executor). `job_id` is the job that actually emitted the entry;
/// `correlation_id` is the root parent id (or `job_id` itself for a root
/// job) and is what the log pipeline demultiplexes on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub job_id: JobId,
    pub correlation_id: JobId,
    pub timestamp_epoch_ms: u64,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogEvent {
    pub fn new(job_id: JobId, correlation_id: JobId, level: LogLevel, message: impl Into<String>, timestamp_epoch_ms: u64) -> Self {
        Self {
            job_id,
            correlation_id,
            timestamp_epoch_ms,
            level,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A persisted log row (`job_logs` table in spec section 6). Entries are
/// append-only; `sequence` is a monotonic per-job counter assigned by the
/// store at append time and is the deterministic tie-breaker within a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub job_id: JobId,
    pub sequence: u64,
    pub timestamp_epoch_ms: u64,
    pub level: LogLevel,
    pub message: String,
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// A UI-facing rendering of a [`LogRecord`]: locale-free `HH:MM:SS`
/// display timestamp, lowercased level, and fields folded into the
/// message text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayLogEntry {
    pub job_id: JobId,
    pub sequence: u64,
    pub timestamp_epoch_ms: u64,
    pub display_time: String,
    pub level: String,
    pub message: String,
}

impl DisplayLogEntry {
    pub fn from_record(record: &LogRecord) -> Self {
        Self {
            job_id: record.job_id,
            sequence: record.sequence,
            timestamp_epoch_ms: record.timestamp_epoch_ms,
            display_time: format_hh_mm_ss(record.timestamp_epoch_ms),
            level: record.level.to_string(),
            message: merge_fields_into_message(&record.message, &record.fields),
        }
    }
}

/// Locale-free `HH:MM:SS` rendering of an epoch-millisecond timestamp, UTC.
pub fn format_hh_mm_ss(epoch_ms: u64) -> String {
    let total_secs = epoch_ms / 1000;
    let secs_of_day = total_secs % 86_400;
    let h = secs_of_day / 3600;
    let m = (secs_of_day % 3600) / 60;
    let s = secs_of_day % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

fn merge_fields_into_message(message: &str, fields: &BTreeMap<String, serde_json::Value>) -> String {
    if fields.is_empty() {
        return message.to_string();
    }
    let mut out = String::with_capacity(message.len() + fields.len() * 16);
    out.push_str(message);
    for (key, value) in fields {
        out.push(' ');
        out.push_str(key);
        out.push('=');
        match value {
            serde_json::Value::String(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
    }
    out
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;

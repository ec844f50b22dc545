//! Wire-facing DTOs and framing for the job-management API and log
//! subscription (spec section 6: "Job-management API (exposed to
//! callers, e.g. an HTTP handler)" and "Log subscriber (exposed)").
//!
//! Everything in this crate is pure data plus the length-prefixed
//! framing used to carry it over a socket; the actual HTTP/WebSocket
//! handlers that drive a UI are a non-goal (spec section 1) and live
//! outside the core entirely. `quaero-daemon` is the one place that
//! turns a [`Request`]/[`Query`] into calls against `quaero-engine` and
//! `quaero-storage` and turns the result back into a [`Response`].
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod query;
mod request;
mod response;
mod types;
mod wire;

pub use query::Query;
pub use request::{ClientMessage, Request};
pub use response::Response;
pub use types::{JobFilterWire, JobSummary, LogEntryWire, ProgressSummary};
pub use wire::{decode, encode, read_message, write_message, ProtocolError};

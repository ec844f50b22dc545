//! The at-rest data model (spec section 3/6): a write-ahead log of
//! [`quaero_core::Event`]s, a [`state::MaterializedState`] folded from it,
//! and [`Store`], the single entry point the rest of the engine uses to
//! read and mutate durable state.
//!
//! Durability model: every mutation is first appended to the [`Wal`],
//! then folded into the in-memory state under one mutex. A periodic
//! [`Snapshot`] lets startup skip replaying the WAL from the beginning;
//! `Store::open` loads the newest snapshot (if any) and replays only the
//! WAL entries after it.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod snapshot;
mod state;
mod store;
mod wal;

pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::{MaterializedState, QueueRecord};
pub use store::{ReceivedMessage, Store, StoreError};
pub use wal::{Wal, WalEntry, WalError};

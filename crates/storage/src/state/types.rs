//! Plain data types held inside [`super::MaterializedState`] that aren't
//! already defined in `quaero-core`.

use quaero_core::QueueMessage;
use serde::{Deserialize, Serialize};

/// A message's bookkeeping on the durable queue: the envelope itself,
/// plus the receive-count and visibility-timeout state the queue needs
/// to hand it out at-least-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueRecord {
    pub message: QueueMessage,
    pub receive_count: u32,
    /// The message is eligible for `Receive` once `now >= visible_at_epoch_ms`.
    pub visible_at_epoch_ms: u64,
    /// Fixed at enqueue time; breaks ties so delivery stays FIFO even
    /// after a message's visibility is extended or reset.
    pub enqueued_at_epoch_ms: u64,
}

//! Durable queue event handlers.

use super::types::QueueRecord;
use super::MaterializedState;
use quaero_core::{Event, MessageId};

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::MessageEnqueued {
            message,
            visible_at_epoch_ms,
        } => {
            state
                .queue
                .entry(message.id.to_string())
                .or_insert_with(|| QueueRecord {
                    message: message.clone(),
                    receive_count: 0,
                    visible_at_epoch_ms: *visible_at_epoch_ms,
                    enqueued_at_epoch_ms: *visible_at_epoch_ms,
                });
        }

        Event::MessageReceived {
            id,
            receive_count,
            invisible_until_epoch_ms,
        } => {
            if let Some(record) = state.queue.get_mut(id.as_str()) {
                record.receive_count = record.receive_count.max(*receive_count);
                record.visible_at_epoch_ms = *invisible_until_epoch_ms;
            }
        }

        Event::MessageVisibilityExtended {
            id,
            invisible_until_epoch_ms,
        } => {
            if let Some(record) = state.queue.get_mut(id.as_str()) {
                record.visible_at_epoch_ms =
                    record.visible_at_epoch_ms.max(*invisible_until_epoch_ms);
            }
        }

        Event::MessageDeleted { id } => {
            state.queue.remove(id.as_str());
        }

        Event::MessageReleased { id } => {
            if let Some(record) = state.queue.get_mut(id.as_str()) {
                record.visible_at_epoch_ms = 0;
            }
        }

        Event::MessageDropped { id } => {
            if let Some(record) = state.queue.remove(id.as_str()) {
                state.dead_letters.insert(id.to_string(), record.message);
            }
        }

        _ => {}
    }
}

impl MaterializedState {
    /// The oldest enqueued message currently eligible for delivery
    /// (`visible_at_epoch_ms <= now`), if any. Ties broken by message id,
    /// which is monotonically assigned-at-creation order in practice.
    pub fn next_visible_message(&self, now_epoch_ms: u64) -> Option<&QueueRecord> {
        self.queue
            .values()
            .filter(|record| record.visible_at_epoch_ms <= now_epoch_ms)
            .min_by_key(|record| (record.enqueued_at_epoch_ms, record.message.id.to_string()))
    }

    pub fn queue_record(&self, id: &MessageId) -> Option<&QueueRecord> {
        self.queue.get(id.as_str())
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

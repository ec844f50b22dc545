use super::*;
use quaero_core::{JobId, JobKind, MessageId, QueueMessage};

fn message(id: &str, job_id: &str) -> QueueMessage {
    let mut message = QueueMessage::new(
        JobId::from_string(job_id),
        JobId::none(),
        JobKind::CrawlerUrl,
        serde_json::json!({ "url": "https://example.com" }),
    );
    message.id = MessageId::from_string(id);
    message
}

#[test]
fn enqueue_is_idempotent_and_fixes_enqueued_at() {
    let mut state = MaterializedState::default();
    let msg = message("msg-test0000000000001", "job-test00000000000001");
    state.apply_event(&Event::MessageEnqueued {
        message: msg.clone(),
        visible_at_epoch_ms: 1_000,
    });
    state.apply_event(&Event::MessageEnqueued {
        message: msg.clone(),
        visible_at_epoch_ms: 5_000,
    });

    let record = state.queue_record(&msg.id).unwrap();
    assert_eq!(record.enqueued_at_epoch_ms, 1_000);
    assert_eq!(state.queue_len(), 1);
}

#[test]
fn received_message_is_invisible_until_timeout() {
    let mut state = MaterializedState::default();
    let msg = message("msg-test0000000000002", "job-test00000000000002");
    state.apply_event(&Event::MessageEnqueued {
        message: msg.clone(),
        visible_at_epoch_ms: 0,
    });

    assert!(state.next_visible_message(100).is_some());

    state.apply_event(&Event::MessageReceived {
        id: msg.id,
        receive_count: 1,
        invisible_until_epoch_ms: 1_000,
    });

    assert!(state.next_visible_message(100).is_none());
    assert!(state.next_visible_message(1_000).is_some());
    assert_eq!(state.queue_record(&msg.id).unwrap().receive_count, 1);
}

#[test]
fn visibility_extension_is_monotonic() {
    let mut state = MaterializedState::default();
    let msg = message("msg-test0000000000003", "job-test00000000000003");
    state.apply_event(&Event::MessageEnqueued {
        message: msg.clone(),
        visible_at_epoch_ms: 0,
    });
    state.apply_event(&Event::MessageReceived {
        id: msg.id,
        receive_count: 1,
        invisible_until_epoch_ms: 1_000,
    });
    state.apply_event(&Event::MessageVisibilityExtended {
        id: msg.id,
        invisible_until_epoch_ms: 2_000,
    });
    state.apply_event(&Event::MessageVisibilityExtended {
        id: msg.id,
        invisible_until_epoch_ms: 500,
    });

    assert_eq!(state.queue_record(&msg.id).unwrap().visible_at_epoch_ms, 2_000);
}

#[test]
fn released_message_is_immediately_visible_again() {
    let mut state = MaterializedState::default();
    let msg = message("msg-test0000000000004", "job-test00000000000004");
    state.apply_event(&Event::MessageEnqueued {
        message: msg.clone(),
        visible_at_epoch_ms: 0,
    });
    state.apply_event(&Event::MessageReceived {
        id: msg.id,
        receive_count: 1,
        invisible_until_epoch_ms: 9_999,
    });
    state.apply_event(&Event::MessageReleased { id: msg.id });

    assert!(state.next_visible_message(0).is_some());
}

#[test]
fn dropped_message_moves_to_dead_letters() {
    let mut state = MaterializedState::default();
    let msg = message("msg-test0000000000005", "job-test00000000000005");
    state.apply_event(&Event::MessageEnqueued {
        message: msg.clone(),
        visible_at_epoch_ms: 0,
    });
    state.apply_event(&Event::MessageDropped { id: msg.id });

    assert!(state.queue_record(&msg.id).is_none());
    assert!(state.dead_letters.contains_key(msg.id.as_str()));
}

#[test]
fn next_visible_message_picks_oldest_enqueued_first() {
    let mut state = MaterializedState::default();
    let first = message("msg-test0000000000006", "job-test00000000000006");
    let second = message("msg-test0000000000007", "job-test00000000000007");
    state.apply_event(&Event::MessageEnqueued {
        message: first.clone(),
        visible_at_epoch_ms: 10,
    });
    state.apply_event(&Event::MessageEnqueued {
        message: second.clone(),
        visible_at_epoch_ms: 0,
    });

    let next = state.next_visible_message(1_000).unwrap();
    assert_eq!(next.message.id, first.id);
}

#[test]
fn deleted_message_is_removed_from_the_queue() {
    let mut state = MaterializedState::default();
    let msg = message("msg-test0000000000008", "job-test00000000000008");
    state.apply_event(&Event::MessageEnqueued {
        message: msg.clone(),
        visible_at_epoch_ms: 0,
    });
    state.apply_event(&Event::MessageDeleted { id: msg.id });

    assert!(state.queue_record(&msg.id).is_none());
    assert_eq!(state.queue_len(), 0);
}

//! Event fan-out: bounded per-agent message queues with overflow coalescing.
//!
//! Not a separate service — a helper used by the coordination handlers.
//! Grounded on the teacher's bounded ring-buffer eviction idiom, generalized
//! from a byte-bounded buffer to a queue-length bound with a single
//! coalescing sentinel on overflow.

use broker_primitives::{Message, ProjectId, SessionName};
use broker_store::Store;
use tracing::warn;

use crate::error::BrokerResult;
use crate::keys;

const OVERFLOW_SENTINEL: &str = "messages dropped";

/// Appends `message` to `session`'s queue, bounded to `max_queue_len`. On
/// overflow, evicts the oldest message(s) and ensures exactly one coalescing
/// sentinel sits at the head of the queue (never duplicated on repeated
/// overflow).
pub async fn enqueue(
    store: &dyn Store,
    project_id: &ProjectId,
    session: &SessionName,
    message: &Message,
    max_queue_len: usize,
) -> BrokerResult<()> {
    let key = keys::messages(project_id, session);
    let payload = serde_json::to_string(message).expect("Message always serializes");

    let evicted = store
        .list_append_bounded(&key, &payload, Some(max_queue_len))
        .await?;

    if evicted.is_empty() {
        return Ok(());
    }

    warn!(project = %project_id, session = %session, "agent queue overflowed, inserting sentinel");

    let sentinel = Message {
        id: format!("system-{}", crate::time::now_iso8601()),
        from: None,
        kind: broker_primitives::MessageKind::System,
        query_type: None,
        message_type: Some("queue_overflow".to_string()),
        content: serde_json::Value::String(OVERFLOW_SENTINEL.to_string()),
        timestamp: crate::time::now_iso8601(),
        requires_response: None,
        in_reply_to: None,
    };
    let sentinel_payload = serde_json::to_string(&sentinel).expect("sentinel always serializes");

    // Coalesce: only insert a new sentinel if the current front of the queue
    // is not already one.
    let current_head_is_sentinel = store
        .list_tail(&key, None)
        .await?
        .last()
        .is_some_and(|front| front.contains(OVERFLOW_SENTINEL));

    if !current_head_is_sentinel {
        store.list_push_front(&key, &sentinel_payload).await?;
    }

    Ok(())
}

//! Process-wide state, passed explicitly to every handler rather than held in globals.

use std::collections::HashMap;
use std::sync::Arc;

use broker_config::Config;
use broker_store::Store;
use tokio::sync::{oneshot, Mutex};

/// Outcome delivered to a parked `query_agent` caller.
#[derive(Debug)]
pub enum QueryOutcome {
    /// `respond_to_query` supplied this response before the timeout elapsed.
    Responded(String),
    /// The target agent was reaped by the liveness monitor while the query was pending.
    AgentGone,
}

struct PendingSlot {
    to_session: String,
    sender: oneshot::Sender<QueryOutcome>,
}

/// The process-wide pending-query table, heartbeat monitor handle, and store
/// client, bundled for explicit passing into handlers.
///
/// Constructed once at startup and shared (via `Arc`) across every concurrent
/// tool invocation and the liveness monitor's background task.
pub struct BrokerContext {
    /// The backing key-value store.
    pub store: Arc<dyn Store>,
    /// Tunables loaded from the environment at startup.
    pub config: Config,
    pending: Mutex<HashMap<String, PendingSlot>>,
}

impl BrokerContext {
    /// Builds a new context over the given store and configuration.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a pending-query slot for `message_id`, returning the receiver
    /// half. Must be called *before* the query envelope becomes visible to the
    /// target agent, so a responder can never race ahead of registration.
    pub async fn register_pending_query(
        &self,
        message_id: String,
        to_session: String,
    ) -> oneshot::Receiver<QueryOutcome> {
        let (tx, rx) = oneshot::channel();
        let mut guard = self.pending.lock().await;
        guard.insert(message_id, PendingSlot { to_session, sender: tx });
        rx
    }

    /// Removes a pending-query slot without resolving it (used once a parker
    /// gives up after its own timeout fires).
    pub async fn forget_pending_query(&self, message_id: &str) {
        self.pending.lock().await.remove(message_id);
    }

    /// Resolves the pending-query slot for `message_id` with a responder's
    /// answer. Returns `true` if a parked caller was woken, `false` if no
    /// such pending query exists (already timed out, or answered twice).
    pub async fn resolve_pending_query(&self, message_id: &str, response: String) -> bool {
        let slot = self.pending.lock().await.remove(message_id);
        match slot {
            Some(slot) => slot.sender.send(QueryOutcome::Responded(response)).is_ok(),
            None => false,
        }
    }

    /// Wakes (with [`QueryOutcome::AgentGone`]) every pending query whose
    /// target is `session_name`. Called by the liveness monitor when reaping.
    pub async fn wake_pending_queries_for_dead_agent(&self, session_name: &str) {
        let mut guard = self.pending.lock().await;
        let dead: Vec<String> = guard
            .iter()
            .filter(|(_, slot)| slot.to_session == session_name)
            .map(|(id, _)| id.clone())
            .collect();
        for message_id in dead {
            if let Some(slot) = guard.remove(&message_id) {
                let _ = slot.sender.send(QueryOutcome::AgentGone);
            }
        }
    }
}

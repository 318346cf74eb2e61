//! Agent registration, heartbeat, unregistration, and presence listing.
//!
//! Grounded on the teacher's registration controller
//! (`agent-kernel/src/registry.rs`) and lifecycle state machine
//! (`agent-kernel/src/lifecycle.rs`), generalized from a client-side
//! retry/backoff loop into server-side handlers over the shared store.

use broker_primitives::{Agent, AgentStatus, Message, MessageKind, ProjectId, SessionName};
use serde_json::json;
use tracing::{debug, info};

use crate::context::BrokerContext;
use crate::error::{BrokerError, BrokerResult};
use crate::fanout;
use crate::keys;
use crate::locks::release_all_locks_held_by;
use crate::time::now_iso8601;

/// Outcome of [`register_agent`].
#[derive(Debug)]
pub struct RegisterOutcome {
    /// Always `"registered"` on success.
    pub status: &'static str,
    /// Session names of every other currently active agent.
    pub other_active_agents: Vec<String>,
}

async fn load_agents(ctx: &BrokerContext, project_id: &ProjectId) -> BrokerResult<Vec<Agent>> {
    let key = keys::agents(project_id);
    let fields = ctx.store.hash_get_all(&key).await?;
    fields
        .into_iter()
        .map(|(_, json)| {
            serde_json::from_str(&json)
                .map_err(|err| BrokerError::Invalid(format!("corrupt agent record: {err}")))
        })
        .collect()
}

/// Returns every agent currently in `Active` status.
pub(crate) async fn active_agents(
    ctx: &BrokerContext,
    project_id: &ProjectId,
) -> BrokerResult<Vec<Agent>> {
    Ok(load_agents(ctx, project_id)
        .await?
        .into_iter()
        .filter(|agent| agent.status == AgentStatus::Active)
        .collect())
}

async fn refresh_heartbeat(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
) -> BrokerResult<()> {
    let key = keys::heartbeat(project_id, session);
    ctx.store
        .string_set_ttl(&key, &now_iso8601(), ctx.config.heartbeat_timeout_secs)
        .await?;
    Ok(())
}

/// Registers a new agent, or refreshes an existing one reconnecting under the
/// same `task_id`.
///
/// # Errors
///
/// Returns [`BrokerError::Invalid`] if `session_name` is already active under
/// a *different* `task_id`.
pub async fn register_agent(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
    task_id: &str,
    branch: &str,
    description: &str,
) -> BrokerResult<RegisterOutcome> {
    let key = keys::agents(project_id);
    let existing = ctx.store.hash_get(&key, session.as_str()).await?;

    let mut started_at = now_iso8601();
    if let Some(existing_json) = existing {
        let existing: Agent = serde_json::from_str(&existing_json)
            .map_err(|err| BrokerError::Invalid(format!("corrupt agent record: {err}")))?;
        if existing.task_id != task_id {
            return Err(BrokerError::Invalid(format!(
                "session `{session}` is already active for task `{}`",
                existing.task_id
            )));
        }
        started_at = existing.started_at;
        debug!(project = %project_id, %session, "reconnecting existing agent");
    } else {
        info!(project = %project_id, %session, "registering new agent");
    }

    let agent = Agent {
        session_name: session.clone(),
        task_id: task_id.to_string(),
        branch: branch.to_string(),
        description: description.to_string(),
        status: AgentStatus::Active,
        started_at,
    };
    let payload = serde_json::to_string(&agent).expect("Agent always serializes");
    ctx.store.hash_set(&key, session.as_str(), &payload).await?;
    refresh_heartbeat(ctx, project_id, session).await?;

    let peers: Vec<Agent> = active_agents(ctx, project_id)
        .await?
        .into_iter()
        .filter(|peer| peer.session_name != *session)
        .collect();

    let join_message = Message {
        id: format!("system-{}", now_iso8601()),
        from: Some(session.to_string()),
        kind: MessageKind::Broadcast,
        query_type: None,
        message_type: Some("info".to_string()),
        content: serde_json::Value::String(format!("{session} joined the project")),
        timestamp: now_iso8601(),
        requires_response: None,
        in_reply_to: None,
    };
    for peer in &peers {
        fanout::enqueue(
            ctx.store.as_ref(),
            project_id,
            &peer.session_name,
            &join_message,
            ctx.config.max_queue_len,
        )
        .await?;
    }

    Ok(RegisterOutcome {
        status: "registered",
        other_active_agents: peers.into_iter().map(|a| a.session_name.to_string()).collect(),
    })
}

/// Refreshes an agent's heartbeat TTL.
///
/// # Errors
///
/// Returns [`BrokerError::NotRegistered`] if the agent is not currently registered.
pub async fn heartbeat(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
) -> BrokerResult<String> {
    let key = keys::agents(project_id);
    if ctx.store.hash_get(&key, session.as_str()).await?.is_none() {
        return Err(BrokerError::NotRegistered);
    }
    refresh_heartbeat(ctx, project_id, session).await?;
    Ok(now_iso8601())
}

/// Summary of an unregistering agent's final todo counts.
pub type TodoSummary = broker_primitives::TodoSummary;

/// Releases every resource owned by `session` and removes it from the
/// registry, broadcasting its departure to remaining active agents.
///
/// Idempotent: calling this on an already-absent session returns an empty
/// summary rather than erroring, so it composes safely with the liveness
/// monitor reaping the same agent concurrently.
pub async fn unregister_agent(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
) -> BrokerResult<TodoSummary> {
    let todos_key = keys::todos(project_id, session);
    let todos: Vec<broker_primitives::Todo> = ctx
        .store
        .list_tail(&todos_key, None)
        .await?
        .into_iter()
        .rev()
        .filter_map(|raw| serde_json::from_str(&raw).ok())
        .collect();
    let summary = TodoSummary::from_todos(&todos);

    release_all_locks_held_by(ctx, project_id, session).await?;

    ctx.store.delete(&keys::heartbeat(project_id, session)).await?;
    ctx.store.delete(&keys::messages(project_id, session)).await?;
    ctx.store.delete(&todos_key).await?;

    let agents_key = keys::agents(project_id);
    let was_present = ctx
        .store
        .hash_get(&agents_key, session.as_str())
        .await?
        .is_some();
    ctx.store.hash_delete(&agents_key, session.as_str()).await?;

    if was_present {
        let departure = Message {
            id: format!("system-{}", now_iso8601()),
            from: Some(session.to_string()),
            kind: MessageKind::Broadcast,
            query_type: None,
            message_type: Some("info".to_string()),
            content: serde_json::Value::String(format!("{session} left the project")),
            timestamp: now_iso8601(),
            requires_response: None,
            in_reply_to: None,
        };
        for peer in active_agents(ctx, project_id).await? {
            fanout::enqueue(
                ctx.store.as_ref(),
                project_id,
                &peer.session_name,
                &departure,
                ctx.config.max_queue_len,
            )
            .await?;
        }
        info!(project = %project_id, %session, "agent unregistered");
    }

    Ok(summary)
}

/// Returns a map of every active agent's session name to its public info.
pub async fn list_active_agents(
    ctx: &BrokerContext,
    project_id: &ProjectId,
) -> BrokerResult<serde_json::Value> {
    let agents = active_agents(ctx, project_id).await?;
    let map: serde_json::Map<String, serde_json::Value> = agents
        .into_iter()
        .map(|agent| {
            (
                agent.session_name.to_string(),
                json!({
                    "task_id": agent.task_id,
                    "branch": agent.branch,
                    "description": agent.description,
                    "status": agent.status,
                    "started_at": agent.started_at,
                }),
            )
        })
        .collect();
    Ok(serde_json::Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_config::Config;
    use broker_store::memory::MemoryStore;
    use std::sync::Arc;

    fn ctx() -> BrokerContext {
        BrokerContext::new(Arc::new(MemoryStore::new()), Config::default())
    }

    #[tokio::test]
    async fn first_registration_has_no_peers() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let session = SessionName::new("task-001").unwrap();
        let outcome = register_agent(&ctx, &project, &session, "001", "br/a", "A")
            .await
            .unwrap();
        assert_eq!(outcome.status, "registered");
        assert!(outcome.other_active_agents.is_empty());
    }

    #[tokio::test]
    async fn second_registration_sees_first_and_first_is_notified() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let s1 = SessionName::new("task-001").unwrap();
        let s2 = SessionName::new("task-002").unwrap();

        register_agent(&ctx, &project, &s1, "001", "br/a", "A")
            .await
            .unwrap();
        let outcome = register_agent(&ctx, &project, &s2, "002", "br/b", "B")
            .await
            .unwrap();
        assert_eq!(outcome.other_active_agents, vec!["task-001".to_string()]);

        let key = keys::messages(&project, &s1);
        let queued = ctx.store.list_tail(&key, None).await.unwrap();
        assert_eq!(queued.len(), 1);
        assert!(queued[0].contains("joined"));
    }

    #[tokio::test]
    async fn reregistration_with_different_task_id_is_rejected() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let session = SessionName::new("task-001").unwrap();
        register_agent(&ctx, &project, &session, "001", "br/a", "A")
            .await
            .unwrap();
        let err = register_agent(&ctx, &project, &session, "999", "br/a", "A")
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Invalid(_)));
    }

    #[tokio::test]
    async fn heartbeat_requires_registration() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let session = SessionName::new("task-001").unwrap();
        let err = heartbeat(&ctx, &project, &session).await.unwrap_err();
        assert!(matches!(err, BrokerError::NotRegistered));
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let session = SessionName::new("task-001").unwrap();
        register_agent(&ctx, &project, &session, "001", "br/a", "A")
            .await
            .unwrap();
        unregister_agent(&ctx, &project, &session).await.unwrap();
        // Second call must not error even though the agent is already gone.
        let summary = unregister_agent(&ctx, &project, &session).await.unwrap();
        assert_eq!(summary.total, 0);
    }
}

//! Task completion: durable record, agent status transition, broadcast.

use broker_primitives::{AgentStatus, Agent, CompletionRecord, ProjectId, SessionName};
use serde_json::json;
use tracing::warn;

use crate::context::BrokerContext;
use crate::error::{BrokerError, BrokerResult};
use crate::keys;
use crate::messaging::broadcast_message;
use crate::time::now_iso8601;

/// Marks `task_id` complete for `session`: writes a durable completion
/// record, flips the agent's status to `completed`, best-effort writes a
/// status marker file, and broadcasts the completion to other active agents.
pub async fn mark_task_completed(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
    task_id: &str,
) -> BrokerResult<()> {
    let record = CompletionRecord {
        task_id: task_id.to_string(),
        session_name: session.clone(),
        completed_at: now_iso8601(),
    };
    let payload = serde_json::to_string(&record).expect("CompletionRecord always serializes");
    ctx.store
        .string_set(&keys::completed(project_id, task_id), &payload)
        .await?;

    let agents_key = keys::agents(project_id);
    if let Some(raw) = ctx.store.hash_get(&agents_key, session.as_str()).await? {
        let mut agent: Agent = serde_json::from_str(&raw)
            .map_err(|err| BrokerError::Invalid(format!("corrupt agent record: {err}")))?;
        agent.status = AgentStatus::Completed;
        let updated = serde_json::to_string(&agent).expect("Agent always serializes");
        ctx.store.hash_set(&agents_key, session.as_str(), &updated).await?;
    }

    write_status_marker(ctx, session).await;

    broadcast_message(
        ctx,
        project_id,
        session,
        "task_completed",
        json!({"task_id": task_id}),
    )
    .await?;

    Ok(())
}

async fn write_status_marker(ctx: &BrokerContext, session: &SessionName) {
    let path = std::path::Path::new(&ctx.config.status_dir).join(format!("{session}.status"));
    if let Err(err) = tokio::fs::create_dir_all(&ctx.config.status_dir).await {
        warn!(%err, path = %path.display(), "failed to create status directory");
        return;
    }
    if let Err(err) = tokio::fs::write(&path, "COMPLETED").await {
        warn!(%err, path = %path.display(), "failed to write completion status marker");
    }
}

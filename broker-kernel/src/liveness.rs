//! Background liveness monitor: reaps agents whose heartbeat TTL expired.

use std::sync::Arc;
use std::time::Duration;

use broker_primitives::{Agent, ProjectId};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::context::BrokerContext;
use crate::error::BrokerResult;
use crate::keys;
use crate::locks::release_all_locks_held_by;
use crate::recent_changes::record_change;
use crate::registration::active_agents;
use crate::time::now_iso8601;

/// The set of projects the monitor currently knows to sweep.
///
/// A stdio broker process learns which projects exist only as tool calls name
/// them, so the transport binary grows this set at dispatch time rather than
/// the monitor discovering it from the store.
pub type KnownProjects = Arc<Mutex<Vec<ProjectId>>>;

/// Spawns the background sweep loop on [`broker_config::Config::monitor_interval_secs`].
///
/// Idempotent against a concurrent `unregister_agent`: both paths key off the
/// same store-level presence check, so whichever runs second observes the
/// agent already gone and does nothing further.
pub fn spawn(ctx: Arc<BrokerContext>, project_ids: KnownProjects) -> tokio::task::JoinHandle<()> {
    let interval = Duration::from_secs(ctx.config.monitor_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let snapshot = project_ids.lock().await.clone();
            for project_id in &snapshot {
                if let Err(err) = sweep(&ctx, project_id).await {
                    warn!(project = %project_id, %err, "liveness sweep failed");
                }
            }
        }
    })
}

async fn sweep(ctx: &BrokerContext, project_id: &ProjectId) -> BrokerResult<()> {
    for agent in active_agents(ctx, project_id).await? {
        let heartbeat_key = keys::heartbeat(project_id, &agent.session_name);
        if !ctx.store.exists(&heartbeat_key).await? {
            reap(ctx, project_id, &agent).await?;
        }
    }
    Ok(())
}

async fn reap(ctx: &BrokerContext, project_id: &ProjectId, agent: &Agent) -> BrokerResult<()> {
    let session = &agent.session_name;

    // Re-check presence: a concurrent unregister_agent may have already
    // removed this session between the scan and this point.
    let agents_key = keys::agents(project_id);
    if ctx.store.hash_get(&agents_key, session.as_str()).await?.is_none() {
        return Ok(());
    }

    release_all_locks_held_by(ctx, project_id, session).await?;
    record_change(
        ctx,
        project_id,
        None,
        None,
        None,
        &format!("agent {session} reaped after heartbeat expiry"),
    )
    .await?;

    ctx.store.hash_delete(&agents_key, session.as_str()).await?;
    ctx.store.delete(&keys::messages(project_id, session)).await?;
    ctx.store.delete(&keys::todos(project_id, session)).await?;

    ctx.wake_pending_queries_for_dead_agent(session.as_str()).await;

    let notice = broker_primitives::Message {
        id: format!("system-{}", now_iso8601()),
        from: None,
        kind: broker_primitives::MessageKind::Broadcast,
        query_type: None,
        message_type: Some("agent_died".to_string()),
        content: json!({"session_name": session.to_string()}),
        timestamp: now_iso8601(),
        requires_response: None,
        in_reply_to: None,
    };
    for peer in active_agents(ctx, project_id).await? {
        crate::fanout::enqueue(
            ctx.store.as_ref(),
            project_id,
            &peer.session_name,
            &notice,
            ctx.config.max_queue_len,
        )
        .await?;
    }

    info!(project = %project_id, %session, "reaped dead agent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::register_agent;
    use broker_config::Config;
    use broker_primitives::SessionName;
    use broker_store::memory::MemoryStore;

    fn ctx() -> BrokerContext {
        let config = Config {
            heartbeat_timeout_secs: 0,
            ..Config::default()
        };
        BrokerContext::new(Arc::new(MemoryStore::new()), config)
    }

    #[tokio::test]
    async fn sweep_reaps_expired_agent_and_releases_locks() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let session = SessionName::new("task-001").unwrap();
        register_agent(&ctx, &project, &session, "001", "br/a", "A")
            .await
            .unwrap();
        crate::locks::announce_file_change(&ctx, &project, &session, "x.rs", "modify", "d")
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        sweep(&ctx, &project).await.unwrap();

        let remaining = active_agents(&ctx, &project).await.unwrap();
        assert!(remaining.is_empty());

        let outcome =
            crate::locks::announce_file_change(&ctx, &project, &session, "x.rs", "modify", "d2")
                .await
                .unwrap();
        assert!(matches!(outcome, crate::locks::AnnounceOutcome::Locked));
    }

    #[tokio::test]
    async fn sweep_is_idempotent_after_manual_unregister() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let session = SessionName::new("task-001").unwrap();
        register_agent(&ctx, &project, &session, "001", "br/a", "A")
            .await
            .unwrap();
        crate::registration::unregister_agent(&ctx, &project, &session)
            .await
            .unwrap();
        sweep(&ctx, &project).await.unwrap();
    }
}

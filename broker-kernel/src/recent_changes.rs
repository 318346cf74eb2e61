//! Project-owned, bounded log of file-modification announcements.

use broker_primitives::{ProjectId, RecentChange, SessionName};

use crate::context::BrokerContext;
use crate::error::BrokerResult;
use crate::keys;
use crate::time::now_iso8601;

/// Appends a change entry to the project's recent-changes log, evicting the
/// oldest entry once [`broker_config::Config::recent_changes_cap`] is exceeded.
pub(crate) async fn record_change(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: Option<&SessionName>,
    file_path: Option<&str>,
    change_type: Option<&str>,
    description: &str,
) -> BrokerResult<()> {
    let entry = RecentChange {
        session_name: session.map(ToString::to_string),
        file_path: file_path.map(ToString::to_string),
        change_type: change_type.map(ToString::to_string),
        description: description.to_string(),
        timestamp: now_iso8601(),
    };
    let payload = serde_json::to_string(&entry).expect("RecentChange always serializes");
    let key = keys::recent_changes(project_id);
    ctx.store
        .list_append_bounded(&key, &payload, Some(ctx.config.recent_changes_cap))
        .await?;
    Ok(())
}

/// Returns up to `limit` most recent change entries, newest first. `limit` is
/// clamped to the configured cap; `limit == 0` yields an empty list.
pub async fn get_recent_changes(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    limit: usize,
) -> BrokerResult<Vec<RecentChange>> {
    let clamped = limit.min(ctx.config.recent_changes_cap);
    if clamped == 0 {
        return Ok(Vec::new());
    }
    let key = keys::recent_changes(project_id);
    let raw = ctx.store.list_tail(&key, Some(clamped)).await?;
    Ok(raw
        .into_iter()
        .filter_map(|json| serde_json::from_str(&json).ok())
        .collect())
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
    async fn zero_limit_returns_empty() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let session = SessionName::new("task-001").unwrap();
        record_change(&ctx, &project, Some(&session), Some("a.rs"), Some("modify"), "x")
            .await
            .unwrap();
        let changes = get_recent_changes(&ctx, &project, 0).await.unwrap();
        assert!(changes.is_empty());
    }

    #[tokio::test]
    async fn returns_newest_first() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let session = SessionName::new("task-001").unwrap();
        for path in ["a.rs", "b.rs", "c.rs"] {
            record_change(&ctx, &project, Some(&session), Some(path), Some("modify"), path)
                .await
                .unwrap();
        }
        let changes = get_recent_changes(&ctx, &project, 20).await.unwrap();
        assert_eq!(changes[0].file_path.as_deref(), Some("c.rs"));
        assert_eq!(changes[2].file_path.as_deref(), Some("a.rs"));
    }
}

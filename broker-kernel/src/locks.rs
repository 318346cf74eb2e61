//! Advisory file locks: a compare-and-set map from file path to holder.
//!
//! Grounded on the teacher's lock-acquisition idiom built over the store's
//! hash primitives; "advisory" is load-bearing — the broker only tracks
//! claims, it never touches the filesystem.

use broker_primitives::{FileLock, ProjectId, SessionName};
use serde_json::json;
use tracing::info;

use crate::context::BrokerContext;
use crate::error::BrokerResult;
use crate::keys;
use crate::recent_changes::record_change;
use crate::time::now_iso8601;

/// Outcome of [`announce_file_change`].
#[derive(Debug)]
pub enum AnnounceOutcome {
    /// The lock was newly acquired, or refreshed by its existing owner.
    Locked,
    /// The lock is held by a different session; state was left untouched.
    Conflict {
        /// The current holder's lock record.
        lock_info: FileLock,
    },
}

/// Announces intent to modify `file_path`, acquiring the advisory lock if
/// free, re-entrantly refreshing it if already owned by `session`, or
/// returning a conflict (without mutating state) if held by another session.
pub async fn announce_file_change(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
    file_path: &str,
    change_type: &str,
    description: &str,
) -> BrokerResult<AnnounceOutcome> {
    let key = keys::locks(project_id);
    let lock = FileLock {
        session_name: session.clone(),
        locked_at: now_iso8601(),
        change_type: change_type.to_string(),
        description: description.to_string(),
    };
    let payload = serde_json::to_string(&lock).expect("FileLock always serializes");

    let acquired = ctx.store.hash_set_if_absent(&key, file_path, &payload).await?;
    if acquired {
        record_change(
            ctx,
            project_id,
            Some(session),
            Some(file_path),
            Some(change_type),
            &format!("{session} claimed {file_path}"),
        )
        .await?;
        return Ok(AnnounceOutcome::Locked);
    }

    let existing_json = ctx
        .store
        .hash_get(&key, file_path)
        .await?
        .expect("hash_set_if_absent reported occupied");
    let existing: FileLock = serde_json::from_str(&existing_json)
        .map_err(|err| crate::error::BrokerError::Invalid(format!("corrupt lock record: {err}")))?;

    if existing.session_name == *session {
        // Re-entrant refresh: same owner, overwrite unconditionally.
        ctx.store.hash_set(&key, file_path, &payload).await?;
        return Ok(AnnounceOutcome::Locked);
    }

    Ok(AnnounceOutcome::Conflict { lock_info: existing })
}

/// Releases the lock on `file_path`, if and only if `session` is the current
/// owner. Idempotent: releasing an absent lock succeeds silently.
///
/// # Errors
///
/// Returns [`crate::error::BrokerError::Invalid`] if the lock is held by a
/// different session.
pub async fn release_file_lock(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
    file_path: &str,
) -> BrokerResult<()> {
    let key = keys::locks(project_id);
    let Some(existing_json) = ctx.store.hash_get(&key, file_path).await? else {
        return Ok(());
    };
    let existing: FileLock = serde_json::from_str(&existing_json)
        .map_err(|err| crate::error::BrokerError::Invalid(format!("corrupt lock record: {err}")))?;

    if existing.session_name != *session {
        return Err(crate::error::BrokerError::Invalid("not owner".to_string()));
    }

    ctx.store.hash_delete(&key, file_path).await?;
    Ok(())
}

/// Releases every lock currently held by `session`, used by unregistration
/// and the liveness monitor's reap path. Best-effort: a lock whose record
/// fails to parse is skipped rather than aborting the whole sweep.
pub async fn release_all_locks_held_by(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
) -> BrokerResult<()> {
    let key = keys::locks(project_id);
    let all = ctx.store.hash_get_all(&key).await?;
    for (file_path, raw) in all {
        let Ok(lock) = serde_json::from_str::<FileLock>(&raw) else {
            continue;
        };
        if lock.session_name == *session {
            ctx.store.hash_delete(&key, &file_path).await?;
            info!(project = %project_id, %session, %file_path, "released lock on departure");
        }
    }
    Ok(())
}

/// Renders a [`FileLock`] as the wire-shaped `lock_info` JSON payload.
#[must_use]
pub fn lock_info_json(lock: &FileLock) -> serde_json::Value {
    json!({
        "session_name": lock.session_name,
        "locked_at": lock.locked_at,
        "change_type": lock.change_type,
        "description": lock.description,
    })
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
    async fn second_claimant_conflicts_without_mutating_state() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let s1 = SessionName::new("task-001").unwrap();
        let s2 = SessionName::new("task-002").unwrap();

        let first = announce_file_change(&ctx, &project, &s1, "src/x.ts", "modify", "X")
            .await
            .unwrap();
        assert!(matches!(first, AnnounceOutcome::Locked));

        let second = announce_file_change(&ctx, &project, &s2, "src/x.ts", "modify", "Y")
            .await
            .unwrap();
        match second {
            AnnounceOutcome::Conflict { lock_info } => {
                assert_eq!(lock_info.session_name, s1);
            }
            AnnounceOutcome::Locked => panic!("expected conflict"),
        }
    }

    #[tokio::test]
    async fn same_session_refresh_is_reentrant() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let s1 = SessionName::new("task-001").unwrap();
        announce_file_change(&ctx, &project, &s1, "src/x.ts", "modify", "X")
            .await
            .unwrap();
        let refreshed = announce_file_change(&ctx, &project, &s1, "src/x.ts", "modify", "X2")
            .await
            .unwrap();
        assert!(matches!(refreshed, AnnounceOutcome::Locked));
    }

    #[tokio::test]
    async fn release_then_reacquire_by_other_session() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let s1 = SessionName::new("task-001").unwrap();
        let s2 = SessionName::new("task-002").unwrap();

        announce_file_change(&ctx, &project, &s1, "src/x.ts", "modify", "X")
            .await
            .unwrap();
        release_file_lock(&ctx, &project, &s1, "src/x.ts").await.unwrap();
        let outcome = announce_file_change(&ctx, &project, &s2, "src/x.ts", "modify", "Y")
            .await
            .unwrap();
        assert!(matches!(outcome, AnnounceOutcome::Locked));
    }

    #[tokio::test]
    async fn release_by_non_owner_is_rejected() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let s1 = SessionName::new("task-001").unwrap();
        let s2 = SessionName::new("task-002").unwrap();
        announce_file_change(&ctx, &project, &s1, "src/x.ts", "modify", "X")
            .await
            .unwrap();
        let err = release_file_lock(&ctx, &project, &s2, "src/x.ts").await.unwrap_err();
        assert!(matches!(err, crate::error::BrokerError::Invalid(_)));
    }

    #[tokio::test]
    async fn release_of_absent_lock_is_idempotent() {
        let ctx = ctx();
        let project = ProjectId::new("p").unwrap();
        let session = SessionName::new("task-001").unwrap();
        release_file_lock(&ctx, &project, &session, "src/missing.ts")
            .await
            .unwrap();
    }
}

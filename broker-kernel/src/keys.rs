//! Namespaced store key construction for each entity kind.

use broker_primitives::{ProjectId, SessionName};
use broker_store::{project_key, project_key_id};

pub(crate) fn agents(project_id: &ProjectId) -> String {
    project_key(project_id, "agents")
}

pub(crate) fn heartbeat(project_id: &ProjectId, session: &SessionName) -> String {
    project_key_id(project_id, "heartbeat", session.as_str())
}

pub(crate) fn todos(project_id: &ProjectId, session: &SessionName) -> String {
    project_key_id(project_id, "todos", session.as_str())
}

pub(crate) fn messages(project_id: &ProjectId, session: &SessionName) -> String {
    project_key_id(project_id, "messages", session.as_str())
}

pub(crate) fn locks(project_id: &ProjectId) -> String {
    project_key(project_id, "locks")
}

pub(crate) fn interfaces(project_id: &ProjectId) -> String {
    project_key(project_id, "interfaces")
}

pub(crate) fn recent_changes(project_id: &ProjectId) -> String {
    project_key(project_id, "recent_changes")
}

pub(crate) fn completed(project_id: &ProjectId, task_id: &str) -> String {
    project_key_id(project_id, "completed", task_id)
}

/// Prefix under which every heartbeat key in `project_id` lives, for the
/// liveness monitor's scan.
pub(crate) fn heartbeat_prefix(project_id: &ProjectId) -> String {
    format!("project:{project_id}:heartbeat:")
}

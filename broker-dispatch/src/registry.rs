//! Static metadata for the broker's enumerated tool set.
//!
//! Unlike the teacher's dynamic, runtime-populated registry, the coordination
//! protocol pins a fixed tool set known at compile time — `list_tools()` is a
//! plain table rather than something tools register themselves into.

/// Describes one callable tool: its name, required argument names (in
/// declaration order), and a human-readable summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolMetadata {
    /// Wire name of the tool, as passed to `call_tool`.
    pub name: &'static str,
    /// Argument names the dispatcher requires before routing to the handler.
    pub required_args: &'static [&'static str],
    /// One-line description of the tool's purpose.
    pub description: &'static str,
}

/// The full enumerated tool set, in the order the coordination protocol lists them.
pub const TOOLS: &[ToolMetadata] = &[
    ToolMetadata {
        name: "register_agent",
        required_args: &["project_id", "session_name", "task_id", "branch", "description"],
        description: "Registers a new agent (or refreshes a reconnecting one) in a project",
    },
    ToolMetadata {
        name: "heartbeat",
        required_args: &["project_id", "session_name"],
        description: "Refreshes an agent's liveness heartbeat",
    },
    ToolMetadata {
        name: "unregister_agent",
        required_args: &["project_id", "session_name"],
        description: "Releases an agent's resources and removes it from the registry",
    },
    ToolMetadata {
        name: "list_active_agents",
        required_args: &["project_id"],
        description: "Lists every currently active agent in a project",
    },
    ToolMetadata {
        name: "mark_task_completed",
        required_args: &["project_id", "session_name", "task_id"],
        description: "Records durable completion of a task and notifies other agents",
    },
    ToolMetadata {
        name: "add_todo",
        required_args: &["project_id", "session_name", "todo_item", "priority"],
        description: "Appends a todo item to an agent's list",
    },
    ToolMetadata {
        name: "update_todo",
        required_args: &["project_id", "session_name", "todo_id", "status"],
        description: "Updates the status of one of an agent's todo items",
    },
    ToolMetadata {
        name: "get_my_todos",
        required_args: &["project_id", "session_name"],
        description: "Returns an agent's own todo list",
    },
    ToolMetadata {
        name: "get_all_todos",
        required_args: &["project_id"],
        description: "Returns every active agent's todo list with summary counters",
    },
    ToolMetadata {
        name: "query_agent",
        required_args: &["project_id", "from_session", "to_session", "query_type", "query"],
        description: "Sends a direct query to another agent, optionally awaiting its response",
    },
    ToolMetadata {
        name: "check_messages",
        required_args: &["project_id", "session_name"],
        description: "Drains an agent's message queue",
    },
    ToolMetadata {
        name: "respond_to_query",
        required_args: &["project_id", "from_session", "to_session", "message_id", "response"],
        description: "Answers a previously received query",
    },
    ToolMetadata {
        name: "broadcast_message",
        required_args: &["project_id", "session_name", "message_type", "content"],
        description: "Fans a notification out to every other active agent",
    },
    ToolMetadata {
        name: "announce_file_change",
        required_args: &["project_id", "session_name", "file_path", "change_type", "description"],
        description: "Claims (or refreshes) an advisory lock on a file path",
    },
    ToolMetadata {
        name: "release_file_lock",
        required_args: &["project_id", "session_name", "file_path"],
        description: "Releases an advisory file lock owned by the caller",
    },
    ToolMetadata {
        name: "get_recent_changes",
        required_args: &["project_id"],
        description: "Returns the project's recent file-change log, newest first",
    },
    ToolMetadata {
        name: "register_interface",
        required_args: &["project_id", "session_name", "interface_name", "definition"],
        description: "Registers a shared type or contract definition",
    },
    ToolMetadata {
        name: "query_interface",
        required_args: &["project_id", "interface_name"],
        description: "Looks up a registered interface, suggesting similar names on miss",
    },
    ToolMetadata {
        name: "list_interfaces",
        required_args: &["project_id"],
        description: "Returns every registered interface in a project",
    },
];

/// Names of every state-mutating tool whose presence of a `session_name`
/// argument should trigger an implicit heartbeat refresh, per the
/// coordination protocol's "any state-mutating call" rule. Read-only lookups
/// (`list_active_agents`, `get_all_todos`, `get_recent_changes`,
/// `query_interface`, `list_interfaces`) are excluded.
pub const HEARTBEAT_ON_CALL: &[&str] = &[
    "heartbeat",
    "unregister_agent",
    "mark_task_completed",
    "add_todo",
    "update_todo",
    "get_my_todos",
    "query_agent",
    "check_messages",
    "respond_to_query",
    "broadcast_message",
    "announce_file_change",
    "release_file_lock",
    "register_interface",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tool_has_a_unique_name() {
        let mut names: Vec<_> = TOOLS.iter().map(|t| t.name).collect();
        names.sort_unstable();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
    }
}

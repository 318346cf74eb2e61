//! Shared data-model types persisted by the coordination broker.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result, SessionName};

/// Lifecycle status of a registered agent.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// The agent is registered and expected to be heartbeating.
    Active,
    /// The agent called `mark_task_completed`.
    Completed,
}

/// A registered participant in a project's coordination namespace.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    /// Unique session identity within the project.
    pub session_name: SessionName,
    /// Task the agent was started to work on.
    pub task_id: String,
    /// Branch the agent is operating on.
    pub branch: String,
    /// Free-text description of the agent's assignment.
    pub description: String,
    /// Current lifecycle status.
    pub status: AgentStatus,
    /// ISO-8601 UTC timestamp of first registration.
    pub started_at: String,
}

/// Status of a single todo item.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    /// Not yet started.
    Pending,
    /// Currently being worked.
    InProgress,
    /// Finished.
    Completed,
    /// Stalled on an external dependency.
    Blocked,
}

/// Priority of a todo item, constrained to `{1, 2, 3}`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    /// Creates a priority value, validating it falls within `1..=3`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidModel`] if `value` is not 1, 2, or 3.
    pub fn new(value: u8) -> Result<Self> {
        if (1..=3).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidModel {
                what: "todo priority",
                reason: "must be 1, 2, or 3".into(),
            })
        }
    }

    /// Returns the underlying numeric priority.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// A single unit of self-reported work progress attached to an agent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    /// Monotonic identifier, unique within the owning agent.
    pub id: u64,
    /// Free-text description of the work item.
    pub text: String,
    /// Current status.
    pub status: TodoStatus,
    /// Priority, 1 (highest) through 3 (lowest).
    pub priority: Priority,
    /// ISO-8601 UTC creation timestamp.
    pub created_at: String,
    /// ISO-8601 UTC completion timestamp, set on transition into `completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Summary counters over an agent's todo list.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct TodoSummary {
    /// Total todos recorded.
    pub total: usize,
    /// Todos in `completed` status.
    pub completed: usize,
    /// Todos in `pending` status.
    pub pending: usize,
    /// Todos in `in_progress` status.
    pub in_progress: usize,
}

impl TodoSummary {
    /// Computes a summary over a slice of todos.
    #[must_use]
    pub fn from_todos(todos: &[Todo]) -> Self {
        let mut summary = Self {
            total: todos.len(),
            ..Self::default()
        };
        for todo in todos {
            match todo.status {
                TodoStatus::Completed => summary.completed += 1,
                TodoStatus::Pending => summary.pending += 1,
                TodoStatus::InProgress => summary.in_progress += 1,
                TodoStatus::Blocked => {}
            }
        }
        summary
    }
}

/// A declared, advisory claim of intent to modify a file path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileLock {
    /// Session holding the lock.
    pub session_name: SessionName,
    /// ISO-8601 UTC timestamp the lock was acquired or last refreshed.
    pub locked_at: String,
    /// Caller-supplied change category (e.g. `modify`, `create`, `delete`).
    pub change_type: String,
    /// Free-text description of the intended change.
    pub description: String,
}

/// A shared type or contract definition discoverable across agents.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterfaceRecord {
    /// The definition payload, opaque to the broker.
    pub definition: Value,
    /// Session that (most recently) registered this interface.
    pub registered_by: SessionName,
    /// Optional file path the interface is defined in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// ISO-8601 UTC registration timestamp.
    pub timestamp: String,
}

/// The tag discriminating [`Message`] envelope kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A direct question awaiting a response.
    Query,
    /// A reply to a previously sent query.
    Response,
    /// A fan-out notification visible to every active agent.
    Broadcast,
    /// A broker-generated notice (e.g. overflow sentinel, reap notice).
    System,
}

/// The structured wrapper around every inter-agent message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Unique, monotonically-ordered identifier within the recipient's queue.
    pub id: String,
    /// Sending session. `None` for broker-originated system messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Discriminant for this envelope.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Caller-supplied categorisation of a query's subject matter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
    /// Caller-supplied message type for broadcasts (e.g. `agent_died`, `info`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    /// Body of the message.
    pub content: Value,
    /// ISO-8601 UTC send timestamp.
    pub timestamp: String,
    /// Set on queries that expect a correlated response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_response: Option<bool>,
    /// Set on responses, correlating back to the originating query's `id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
}

/// A bounded, FIFO-capped log entry of a file-modification announcement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecentChange {
    /// Session that announced the change, or `None` for system entries (e.g. reap notices).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    /// File path affected, absent for pure system entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Caller-supplied change category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_type: Option<String>,
    /// Human-readable description of the change or system event.
    pub description: String,
    /// ISO-8601 UTC timestamp.
    pub timestamp: String,
}

/// A durable record of task completion, outliving the agent's unregistration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Task identifier.
    pub task_id: String,
    /// Session that completed the task.
    pub session_name: SessionName,
    /// ISO-8601 UTC completion timestamp.
    pub completed_at: String,
}

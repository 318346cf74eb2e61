//! Core shared types for the agent coordination broker.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod model;

/// Error type and result alias shared across the broker crates.
pub use error::{Error, Result};
/// Namespace, session, and task identifier newtypes.
pub use ids::{ProjectId, SessionName, TaskId};
/// Persisted entities: agents, todos, locks, interfaces, messages, changes, completions.
pub use model::{
    Agent, AgentStatus, CompletionRecord, FileLock, InterfaceRecord, Message, MessageKind,
    Priority, RecentChange, Todo, TodoStatus, TodoSummary,
};

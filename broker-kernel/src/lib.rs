//! The coordination engine: registration, todos, messaging, locks, the
//! interface registry, completion tracking, and the liveness monitor.
//!
//! This crate contains the business logic invoked by each of the dispatcher's
//! tool handlers. Every operation takes a shared [`BrokerContext`] and the
//! project/session identifiers it scopes state to; none of it knows about the
//! wire transport.

#![warn(missing_docs, clippy::pedantic)]

mod completion;
mod context;
mod error;
mod fanout;
mod interfaces;
mod keys;
mod locks;
mod messaging;
mod recent_changes;
mod registration;
mod similarity;
mod time;
mod todos;

pub mod liveness;

pub use completion::mark_task_completed;
pub use context::{BrokerContext, QueryOutcome as PendingQueryOutcome};
pub use error::{BrokerError, BrokerResult};
pub use interfaces::{list_interfaces, query_interface, register_interface, QueryOutcome as InterfaceQueryOutcome};
pub use locks::{announce_file_change, lock_info_json, release_file_lock, AnnounceOutcome};
pub use messaging::{broadcast_message, check_messages, query_agent, respond_to_query, QueryOutcomeExternal};
pub use recent_changes::get_recent_changes;
pub use registration::{heartbeat, list_active_agents, register_agent, unregister_agent, RegisterOutcome, TodoSummary};
pub use todos::{add_todo, get_all_todos, get_my_todos, update_todo};
